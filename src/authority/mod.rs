//! Token authority
//!
//! Owns the process signing key. Authenticates credentials, issues tokens
//! with a fixed 24h lifetime, and validates presented tokens. Exposed over
//! HTTP as `POST /login`, `POST /register`, and `GET /validate`.

pub mod http;
mod service;

pub use http::{create_router, run_authority, AuthorityState};
pub use service::{AuthError, AuthorityService, ValidateError};
