//! HTTP client for the authority's validation endpoint

use crate::gateway::GatewayError;
use axum::http::{header, HeaderValue};
use std::time::Duration;
use tracing::debug;

/// Default timeout for a single validation call
pub const DEFAULT_VALIDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for `GET {authority}/validate`.
///
/// Wraps one shared `reqwest::Client`, so every concurrent request on the
/// gateway draws from the same connection pool. An in-flight call suspends
/// the calling task; it never pins a thread.
#[derive(Clone)]
pub struct ValidationClient {
    http: reqwest::Client,
    base_url: String,
}

impl ValidationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::UpstreamUnavailable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Ask the authority whether the presented credential is valid.
    ///
    /// The raw `Authorization` header value is passed through unchanged.
    /// Returns `Ok(true)` on a success status, `Ok(false)` on any other
    /// status, and `Err` when the call itself failed (timeout, refused,
    /// DNS); the caller treats the last two identically.
    pub async fn validate(&self, authorization: &HeaderValue) -> Result<bool, GatewayError> {
        let url = format!("{}/validate", self.base_url);

        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, authorization.clone())
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnavailable(e.to_string()))?;

        let valid = response.status().is_success();
        debug!(status = %response.status(), valid, "Validation verdict");

        Ok(valid)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
