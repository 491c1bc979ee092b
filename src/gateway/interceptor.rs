//! Ordered request-interception pipeline
//!
//! Each stage receives the request context and either passes it on
//! (possibly mutated) or terminates the request with a response status.
//! Stages run strictly in order; the first rejection wins and later stages
//! never see the request.

use crate::auth::BEARER_PREFIX;
use crate::gateway::client::ValidationClient;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Everything a stage may inspect or mutate about an inbound request
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Result of applying one stage
pub enum StageOutcome {
    /// Hand the (possibly mutated) context to the next stage
    Continue(RequestContext),
    /// Terminate with this status and an empty body
    Reject(StatusCode),
}

/// One stage of the interception pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    async fn apply(&self, ctx: RequestContext) -> StageOutcome;
}

/// Ordered stage list applied to every inbound request
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Arc<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Run the request through every stage in order
    pub async fn run(&self, mut ctx: RequestContext) -> StageOutcome {
        for stage in &self.stages {
            match stage.apply(ctx).await {
                StageOutcome::Continue(next) => ctx = next,
                reject => return reject,
            }
        }
        StageOutcome::Continue(ctx)
    }
}

/// Tags each request with an `x-request-id` header for log correlation
pub struct TraceStage;

#[async_trait]
impl Stage for TraceStage {
    async fn apply(&self, mut ctx: RequestContext) -> StageOutcome {
        if !ctx.headers.contains_key("x-request-id") {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                ctx.headers.insert("x-request-id", value);
            }
        }

        debug!(method = %ctx.method, path = %ctx.uri.path(), "Intercepted request");
        StageOutcome::Continue(ctx)
    }
}

/// Bearer-credential checkpoint.
///
/// A missing header or wrong prefix is rejected immediately, without a
/// round trip to the authority. A well-formed bearer is re-validated
/// out-of-process on every request; there is no verdict cache. Any
/// validation failure, including the authority being unreachable, rejects
/// the request.
pub struct BearerAuthStage {
    validator: ValidationClient,
}

impl BearerAuthStage {
    pub fn new(validator: ValidationClient) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Stage for BearerAuthStage {
    async fn apply(&self, ctx: RequestContext) -> StageOutcome {
        let authorization = match ctx.headers.get(header::AUTHORIZATION) {
            Some(value) => value.clone(),
            None => {
                debug!(path = %ctx.uri.path(), "No Authorization header, rejecting");
                return StageOutcome::Reject(StatusCode::UNAUTHORIZED);
            }
        };

        let well_formed = authorization
            .to_str()
            .map(|v| v.starts_with(BEARER_PREFIX))
            .unwrap_or(false);

        if !well_formed {
            debug!(path = %ctx.uri.path(), "Malformed credential, rejecting");
            return StageOutcome::Reject(StatusCode::UNAUTHORIZED);
        }

        match self.validator.validate(&authorization).await {
            Ok(true) => StageOutcome::Continue(ctx),
            Ok(false) => {
                debug!(path = %ctx.uri.path(), "Authority rejected token");
                StageOutcome::Reject(StatusCode::UNAUTHORIZED)
            }
            Err(e) => {
                warn!(error = %e, "Validation call failed, failing closed");
                StageOutcome::Reject(StatusCode::UNAUTHORIZED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context(headers: HeaderMap) -> RequestContext {
        RequestContext {
            method: Method::GET,
            uri: "/api/patients".parse().unwrap(),
            headers,
            body: Bytes::new(),
        }
    }

    /// Records how many requests reached it, then continues or rejects
    struct ProbeStage {
        seen: Arc<AtomicUsize>,
        reject: bool,
    }

    #[async_trait]
    impl Stage for ProbeStage {
        async fn apply(&self, ctx: RequestContext) -> StageOutcome {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                StageOutcome::Reject(StatusCode::FORBIDDEN)
            } else {
                StageOutcome::Continue(ctx)
            }
        }
    }

    #[tokio::test]
    async fn test_pipeline_runs_stages_in_order() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let pipeline = Pipeline::new(vec![
            Arc::new(ProbeStage {
                seen: first.clone(),
                reject: false,
            }),
            Arc::new(ProbeStage {
                seen: second.clone(),
                reject: false,
            }),
        ]);

        let outcome = pipeline.run(context(HeaderMap::new())).await;
        assert!(matches!(outcome, StageOutcome::Continue(_)));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pipeline_short_circuits_on_reject() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let pipeline = Pipeline::new(vec![
            Arc::new(ProbeStage {
                seen: first.clone(),
                reject: true,
            }),
            Arc::new(ProbeStage {
                seen: second.clone(),
                reject: false,
            }),
        ]);

        let outcome = pipeline.run(context(HeaderMap::new())).await;
        assert!(matches!(outcome, StageOutcome::Reject(s) if s == StatusCode::FORBIDDEN));
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_trace_stage_tags_requests() {
        let pipeline = Pipeline::new(vec![Arc::new(TraceStage)]);

        let outcome = pipeline.run(context(HeaderMap::new())).await;
        let StageOutcome::Continue(ctx) = outcome else {
            panic!("trace stage must not reject");
        };
        assert!(ctx.headers.contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_trace_stage_keeps_existing_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("caller-chosen"));

        let pipeline = Pipeline::new(vec![Arc::new(TraceStage)]);
        let StageOutcome::Continue(ctx) = pipeline.run(context(headers)).await else {
            panic!("trace stage must not reject");
        };
        assert_eq!(ctx.headers.get("x-request-id").unwrap(), "caller-chosen");
    }

    // The authority here points at a closed port: these requests must be
    // rejected before any outbound call is attempted, so no connection
    // error can surface either.
    #[tokio::test]
    async fn test_bearer_stage_rejects_without_header() {
        let validator = ValidationClient::new(
            "http://127.0.0.1:9",
            std::time::Duration::from_millis(100),
        )
        .unwrap();
        let stage = BearerAuthStage::new(validator);

        let outcome = stage.apply(context(HeaderMap::new())).await;
        assert!(matches!(outcome, StageOutcome::Reject(s) if s == StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_bearer_stage_rejects_wrong_prefix() {
        let validator = ValidationClient::new(
            "http://127.0.0.1:9",
            std::time::Duration::from_millis(100),
        )
        .unwrap();
        let stage = BearerAuthStage::new(validator);

        for value in ["Basic dXNlcjpwdw==", "bearer lowercase", "Token abc"] {
            let mut headers = HeaderMap::new();
            headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));

            let outcome = stage.apply(context(headers)).await;
            assert!(
                matches!(outcome, StageOutcome::Reject(s) if s == StatusCode::UNAUTHORIZED),
                "accepted malformed credential: {}",
                value
            );
        }
    }

    #[tokio::test]
    async fn test_bearer_stage_fails_closed_when_authority_down() {
        // Well-formed bearer, but nothing is listening on the other side
        let validator = ValidationClient::new(
            "http://127.0.0.1:9",
            std::time::Duration::from_millis(100),
        )
        .unwrap();
        let stage = BearerAuthStage::new(validator);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer some.opaque.token"),
        );

        let outcome = stage.apply(context(headers)).await;
        assert!(matches!(outcome, StageOutcome::Reject(s) if s == StatusCode::UNAUTHORIZED));
    }
}
