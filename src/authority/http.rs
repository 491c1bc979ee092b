//! HTTP surface of the token authority
//!
//! Every failure an external caller can observe collapses to `401` with an
//! empty body; expired, forged, and malformed tokens are indistinguishable
//! on the wire. Fine-grained reasons go to logs only.

use crate::authority::service::{AuthError, AuthorityService, ValidateError};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Shared state for authority handlers
#[derive(Clone)]
pub struct AuthorityState {
    pub service: Arc<AuthorityService>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Create the authority router
pub fn create_router(state: AuthorityState) -> Router {
    Router::new()
        .route("/login", post(login_handler))
        .route("/register", post(register_handler))
        .route("/validate", get(validate_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn login_handler(
    State(state): State<AuthorityState>,
    Json(req): Json<LoginRequest>,
) -> Response {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match state.service.authenticate(&req.email, &req.password).await {
        Ok(token) => Json(TokenResponse { token }).into_response(),
        Err(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED.into_response(),
        Err(e) => {
            error!(error = %e, "Login failed on store or hash");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn register_handler(
    State(state): State<AuthorityState>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    if req.email.trim().is_empty() || req.password.is_empty() || req.role.trim().is_empty() {
        return StatusCode::BAD_REQUEST.into_response();
    }

    match state
        .service
        .register(&req.email, &req.password, &req.role)
        .await
    {
        Ok(token) => {
            info!(email = %req.email, role = %req.role, "Account registered");
            Json(TokenResponse { token }).into_response()
        }
        // Kept as 401 to match the observed wire behavior, not remapped to 409
        Err(AuthError::EmailAlreadyExists) => StatusCode::UNAUTHORIZED.into_response(),
        Err(e) => {
            error!(error = %e, "Registration failed on store or hash");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn validate_handler(State(state): State<AuthorityState>, headers: HeaderMap) -> StatusCode {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(crate::auth::strip_bearer);

    let Some(token) = token else {
        return StatusCode::UNAUTHORIZED;
    };

    match state.service.validate(token) {
        Ok(()) => StatusCode::OK,
        Err(ValidateError::Expired) => {
            debug!("Token rejected: expired");
            StatusCode::UNAUTHORIZED
        }
        Err(ValidateError::Token(e)) => {
            debug!(error = %e, "Token rejected");
            StatusCode::UNAUTHORIZED
        }
    }
}

/// Run the authority server
pub async fn run_authority(bind_addr: SocketAddr, state: AuthorityState) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "Token authority listening");

    axum::serve(listener, app).await?;

    Ok(())
}
