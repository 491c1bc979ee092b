//! Edge gatekeeper
//!
//! Intercepts every inbound request before it reaches a backend. Requests
//! without a well-formed `Authorization: Bearer` header are rejected on the
//! spot; everything else is re-validated against the token authority over
//! HTTP on every request, then forwarded unchanged. Fail-closed: if the
//! authority is unreachable, the request is rejected, never allowed.
//!
//! The gatekeeper never decodes tokens itself; the bearer string is an
//! opaque capability and the only wire knowledge here is the header prefix.

mod client;
mod interceptor;
mod proxy;
mod routes;
pub mod server;

pub use client::{ValidationClient, DEFAULT_VALIDATE_TIMEOUT};
pub use interceptor::{BearerAuthStage, Pipeline, RequestContext, Stage, StageOutcome, TraceStage};
pub use proxy::{Forwarder, DEFAULT_FORWARD_TIMEOUT};
pub use routes::{RouteRule, RouteTable};
pub use server::{create_router, run_gateway, GatewayState};

use thiserror::Error;

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The validation call to the authority did not complete
    #[error("authority unreachable: {0}")]
    UpstreamUnavailable(String),

    /// The forwarded backend request did not complete
    #[error("backend request failed: {0}")]
    Forward(String),

    /// A route rule could not be parsed
    #[error("invalid route rule: {0}")]
    Route(String),
}
