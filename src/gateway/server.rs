//! Gateway HTTP server
//!
//! One fallback handler intercepts every request: body is buffered, the
//! pipeline runs (validate-then-forward, strictly in that order), and only
//! a surviving request is relayed to its backend. If the client disconnects
//! mid-validation the handler task is dropped and the outbound call with it.

use crate::gateway::interceptor::{Pipeline, RequestContext, StageOutcome};
use crate::gateway::proxy::Forwarder;
use crate::gateway::routes::RouteTable;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Largest request body the gateway will buffer for forwarding
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Shared state for the gateway
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    pub routes: Arc<RouteTable>,
    pub forwarder: Arc<Forwarder>,
}

/// Create the gateway router
pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .fallback(intercept_handler)
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn intercept_handler(State(state): State<GatewayState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
    };

    let ctx = RequestContext {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    };

    let ctx = match state.pipeline.run(ctx).await {
        StageOutcome::Continue(ctx) => ctx,
        StageOutcome::Reject(status) => return status.into_response(),
    };

    let Some(rule) = state.routes.find(ctx.uri.path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match state.forwarder.forward(&rule.target, ctx).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            warn!(error = %e, target = %rule.target, "Backend forward failed");
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Run the gateway server
pub async fn run_gateway(bind_addr: SocketAddr, state: GatewayState) -> anyhow::Result<()> {
    for rule in state.routes.rules() {
        info!(prefix = %rule.prefix, target = %rule.target, "Route configured");
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "Edge gatekeeper listening");

    axum::serve(listener, app).await?;

    Ok(())
}
