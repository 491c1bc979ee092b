//! Error types for the authority client

use thiserror::Error;

/// Errors that can occur when talking to the token authority
#[derive(Error, Debug)]
pub enum AuthClientError {
    /// The HTTP request itself failed
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The authority refused the credentials or the registration
    #[error("Unauthorized")]
    Unauthorized,

    /// The authority answered with a status this client does not expect
    #[error("Unexpected status: {0}")]
    UnexpectedStatus(u16),

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type for authority client operations
pub type Result<T> = std::result::Result<T, AuthClientError>;
