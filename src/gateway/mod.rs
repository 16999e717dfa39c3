//! HTTP gateway (Axum) for the detection endpoint.
//!
//! This module is primarily used by the `leafgate` server binary.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use handler::detect_handler;
pub use state::HandlerState;

/// Upper bound on a whole multipart request body (a listing batch of photos).
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn create_router_with_state(state: HandlerState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/detect", post(detect_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub spool: &'static str,
    pub encoder: &'static str,
    pub encoder_mode: &'static str,
    pub concepts: usize,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let spool_status = if state.spool_path.exists() && state.spool_path.is_dir() {
        "ready"
    } else {
        "error"
    };

    let encoder_mode = if state.encoder.is_stub() { "stub" } else { "real" };

    let components = ComponentStatus {
        http: "ready",
        spool: spool_status,
        encoder: "ready",
        encoder_mode,
        concepts: state.concepts.len(),
    };

    let is_ready = components.spool == "ready" && components.concepts > 0;

    let status_code = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let status_msg = if is_ready { "ok" } else { "pending" };

    (
        status_code,
        Json(ReadyResponse {
            status: status_msg,
            components,
        }),
    )
        .into_response()
}
