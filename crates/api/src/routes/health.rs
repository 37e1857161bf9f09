//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use telemetry::{health, metrics};

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health - Full health check.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let report = health().report();
    let snapshot = state.coordinator.snapshot();

    Json(HealthResponse {
        status: format!("{:?}", report.status).to_lowercase(),
        endpoint_connected: health().endpoint.is_healthy(),
        snapshot_loaded: snapshot.is_some(),
        generation: snapshot.map(|s| s.generation),
        components: report.components,
        metrics: metrics().snapshot(),
    })
}

/// GET /health/ready - Readiness probe (a snapshot is available).
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if health().is_ready() && state.coordinator.snapshot().is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
