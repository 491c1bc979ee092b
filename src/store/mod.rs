//! Credential storage backends
//!
//! - Postgres: durable account store used in production
//! - Memory: DashMap-backed store for tests and single-node development

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{PostgresConfig, PostgresStore};

pub use async_trait::async_trait;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("email already registered: {0}")]
    DuplicateEmail(String),
}

/// A stored account record
#[derive(Debug, Clone)]
pub struct Credential {
    /// Account email, unique across the store
    pub email: String,
    /// Bcrypt hash of the password
    pub password_hash: String,
    /// Role granted to tokens issued for this account
    pub role: String,
}

/// Trait for credential storage
///
/// `save` must enforce email uniqueness atomically: when two registrations
/// race on the same email, exactly one succeeds and the other gets
/// `DuplicateEmail`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a credential by email
    async fn lookup_by_email(&self, email: &str) -> Result<Option<Credential>, StoreError>;

    /// Check whether an email is already registered
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    /// Persist a new credential
    async fn save(&self, credential: Credential) -> Result<(), StoreError>;
}
