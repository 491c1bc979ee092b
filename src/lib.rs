//! Medgate - stateless perimeter authentication
//!
//! Two cooperating services over one compact signed-token format: a token
//! authority that issues and validates bearer credentials, and an edge
//! gatekeeper that re-validates every inbound request against the authority
//! before it can reach a backend.

pub mod auth;
pub mod authority;
pub mod gateway;
pub mod store;

pub use auth::{Claims, SigningKey, TokenError};
pub use authority::{AuthError, AuthorityService, ValidateError};
pub use gateway::{GatewayError, Pipeline, RouteTable, ValidationClient};
pub use store::{Credential, CredentialStore, MemoryStore, PostgresStore};
