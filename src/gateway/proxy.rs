//! Backend request forwarding

use crate::gateway::interceptor::RequestContext;
use crate::gateway::GatewayError;
use axum::body::Body;
use axum::http::{header::HeaderName, HeaderMap, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Default timeout for a forwarded backend call
pub const DEFAULT_FORWARD_TIMEOUT: Duration = Duration::from_secs(30);

// Connection-scoped headers that must not travel across the proxy hop.
// Everything else is relayed untouched in both directions.
const HOP_BY_HOP: [HeaderName; 8] = [
    HeaderName::from_static("connection"),
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-authenticate"),
    HeaderName::from_static("proxy-authorization"),
    HeaderName::from_static("te"),
    HeaderName::from_static("trailer"),
    HeaderName::from_static("transfer-encoding"),
    HeaderName::from_static("upgrade"),
];

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        if HOP_BY_HOP.contains(name) || name == &axum::http::header::HOST {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Forwards validated requests to their backend target over one shared
/// connection pool.
#[derive(Clone)]
pub struct Forwarder {
    http: reqwest::Client,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Forward(e.to_string()))?;

        Ok(Self { http })
    }

    /// Relay the request to `target`, preserving method, path, query,
    /// headers, and body, and relay the backend's response back.
    pub async fn forward(
        &self,
        target: &str,
        ctx: RequestContext,
    ) -> Result<Response<Body>, GatewayError> {
        let path_and_query = ctx
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = format!("{}{}", target, path_and_query);

        debug!(method = %ctx.method, url = %url, "Forwarding to backend");

        let upstream = self
            .http
            .request(ctx.method, &url)
            .headers(strip_hop_by_hop(&ctx.headers))
            .body(ctx.body)
            .send()
            .await
            .map_err(|e| GatewayError::Forward(e.to_string()))?;

        let status =
            StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let headers = strip_hop_by_hop(upstream.headers());
        let body = upstream
            .bytes()
            .await
            .map_err(|e| GatewayError::Forward(e.to_string()))?;

        let mut response = Response::builder()
            .status(status)
            .body(Body::from(body))
            .map_err(|e| GatewayError::Forward(e.to_string()))?;
        *response.headers_mut() = headers;

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("host", HeaderValue::from_static("gateway.local"));
        headers.insert("authorization", HeaderValue::from_static("Bearer t"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let out = strip_hop_by_hop(&headers);

        assert!(!out.contains_key("connection"));
        assert!(!out.contains_key("transfer-encoding"));
        assert!(!out.contains_key("host"));
        assert_eq!(out.get("authorization").unwrap(), "Bearer t");
        assert_eq!(out.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn test_strip_keeps_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.append("x-tag", HeaderValue::from_static("one"));
        headers.append("x-tag", HeaderValue::from_static("two"));

        let out = strip_hop_by_hop(&headers);
        let values: Vec<_> = out.get_all("x-tag").iter().collect();
        assert_eq!(values.len(), 2);
    }
}
