//! Medgate Rust Client
//!
//! A typed HTTP client for the medgate token authority: register and log in
//! accounts, and check whether a bearer token still validates.
//!
//! # Example
//!
//! ```no_run
//! use medgate_client::{AuthClient, AuthConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuthConfig::new("http://localhost:8081");
//!     let client = AuthClient::new(config)?;
//!
//!     let token = client.register("a@test.com", "pw1", "DOCTOR").await?;
//!     assert!(client.validate(&token).await?);
//!
//!     let token = client.login("a@test.com", "pw1").await?;
//!     println!("token: {}", token);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod messages;

pub use client::AuthClient;
pub use config::AuthConfig;
pub use error::AuthClientError;
pub use messages::{LoginRequest, RegisterRequest, TokenResponse};
