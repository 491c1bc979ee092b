//! Authority client implementation

use crate::config::AuthConfig;
use crate::error::{AuthClientError, Result};
use crate::messages::{LoginRequest, RegisterRequest, TokenResponse};
use reqwest::StatusCode;
use tracing::debug;

/// HTTP client for the medgate token authority.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct AuthClient {
    config: AuthConfig,
    http: reqwest::Client,
}

impl AuthClient {
    /// Create a new client with the given configuration
    pub fn new(config: AuthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, http })
    }

    /// Authenticate and obtain a fresh token.
    ///
    /// Returns `Unauthorized` for bad credentials; the authority does not
    /// say whether the email or the password was wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .http
            .post(format!("{}/login", self.config.base_url))
            .json(&body)
            .send()
            .await?;

        self.token_from(response).await
    }

    /// Register a new account; returns a token immediately (auto-login)
    pub async fn register(&self, email: &str, password: &str, role: &str) -> Result<String> {
        let body = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        };

        let response = self
            .http
            .post(format!("{}/register", self.config.base_url))
            .json(&body)
            .send()
            .await?;

        self.token_from(response).await
    }

    /// Check whether a token currently validates.
    ///
    /// `Ok(false)` means the authority said no; transport failures are
    /// errors so the caller can tell "rejected" from "unreachable".
    pub async fn validate(&self, token: &str) -> Result<bool> {
        let response = self
            .http
            .get(format!("{}/validate", self.config.base_url))
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            other => Err(AuthClientError::UnexpectedStatus(other.as_u16())),
        }
    }

    async fn token_from(&self, response: reqwest::Response) -> Result<String> {
        match response.status() {
            StatusCode::OK => {
                let body: TokenResponse = response
                    .json()
                    .await
                    .map_err(|e| AuthClientError::Decode(e.to_string()))?;
                debug!("Received token");
                Ok(body.token)
            }
            StatusCode::UNAUTHORIZED => Err(AuthClientError::Unauthorized),
            other => Err(AuthClientError::UnexpectedStatus(other.as_u16())),
        }
    }
}
