//! Refresh trigger and status.

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;
use worker::RefreshStatus;

use crate::response::{ApiError, RefreshAccepted};
use crate::state::AppState;

/// POST /refresh - Start a background refresh.
///
/// 202 when started, 409 (`REFRESH_001`) while another refresh runs.
pub async fn start_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RefreshAccepted>), ApiError> {
    let run_id = state.coordinator.start()?;
    info!(%run_id, "Refresh requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(RefreshAccepted {
            run_id,
            status: "started".to_string(),
        }),
    ))
}

/// GET /refresh - Status of the current or last refresh.
pub async fn status_handler(State(state): State<AppState>) -> Json<RefreshStatus> {
    Json(state.coordinator.status())
}
