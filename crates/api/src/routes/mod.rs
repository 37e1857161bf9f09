//! API routes.

pub mod health;
pub mod hierarchy;
pub mod refresh;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/hierarchy", get(hierarchy::hierarchy_handler))
        .route("/hierarchy/rows", get(hierarchy::rows_handler))
        .route("/hierarchy/cell", get(hierarchy::cell_handler))
        .route(
            "/refresh",
            post(refresh::start_handler).get(refresh::status_handler),
        )
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
