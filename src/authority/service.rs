//! Credential authentication, token issuance, and token validation

use crate::auth::{self, Claims, SigningKey, TokenError};
use crate::store::{Credential, CredentialStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// A well-formed bcrypt hash that no password will ever match.
///
/// Verified against when an email is unknown, so the unknown-email and
/// wrong-password paths cost the same amount of work.
const DUMMY_HASH: &str = "$2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; the two are deliberately merged
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered")]
    EmailAlreadyExists,

    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    #[error("password hash error: {0}")]
    Hash(String),
}

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("{0}")]
    Token(#[from] TokenError),

    #[error("token expired")]
    Expired,
}

/// The token authority.
///
/// Holds the immutable process signing key and a handle to the credential
/// store. Cheap to share behind an `Arc`; no interior mutability.
pub struct AuthorityService {
    store: Arc<dyn CredentialStore>,
    key: SigningKey,
}

impl AuthorityService {
    pub fn new(store: Arc<dyn CredentialStore>, key: SigningKey) -> Self {
        Self { store, key }
    }

    /// Authenticate credentials and issue a token.
    ///
    /// Unknown email and wrong password both return `InvalidCredentials`;
    /// the caller cannot tell them apart.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let credential = self.store.lookup_by_email(email).await?;

        let matched = match &credential {
            Some(c) => bcrypt::verify(password, &c.password_hash)
                .map_err(|e| AuthError::Hash(e.to_string()))?,
            None => {
                // Burn the same bcrypt work as a real comparison
                let _ = bcrypt::verify(password, DUMMY_HASH);
                false
            }
        };

        match (credential, matched) {
            (Some(c), true) => Ok(self.issue(&c)),
            _ => {
                debug!(email = %email, "Authentication failed");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Register a new account and issue a token (auto-login).
    ///
    /// The store's uniqueness constraint is the arbiter for concurrent
    /// registrations; a save-time duplicate maps to `EmailAlreadyExists`
    /// the same as the up-front existence check.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<String, AuthError> {
        if self.store.exists_by_email(email).await? {
            debug!(email = %email, "Registration rejected: email exists");
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AuthError::Hash(e.to_string()))?;

        let credential = Credential {
            email: email.to_string(),
            password_hash,
            role: role.to_string(),
        };

        match self.store.save(credential.clone()).await {
            Ok(()) => Ok(self.issue(&credential)),
            Err(StoreError::DuplicateEmail(_)) => {
                debug!(email = %email, "Registration lost save race");
                Err(AuthError::EmailAlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Validate a token: signature first, then expiry.
    ///
    /// A token is valid strictly before `exp`; from `exp` onward it is
    /// rejected. Only the outcome crosses the service boundary; the
    /// fine-grained reason stays in logs.
    pub fn validate(&self, token: &str) -> Result<(), ValidateError> {
        self.validate_at(token, auth::unix_now())
    }

    fn validate_at(&self, token: &str, now: u64) -> Result<(), ValidateError> {
        let claims = auth::decode(token, &self.key)?;

        if now >= claims.exp {
            return Err(ValidateError::Expired);
        }

        Ok(())
    }

    fn issue(&self, credential: &Credential) -> String {
        let claims = Claims::issue(&credential.email, &credential.role, auth::unix_now());
        auth::encode(&claims, &self.key)
    }
}
