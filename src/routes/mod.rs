//! HTTP route definitions and handlers.
//!
//! The edge server exposes the forward-auth check plus health and metrics.

mod guard_routes;
mod health_routes;
mod metrics;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(guard_routes::routes())
        .merge(health_routes::routes())
        .merge(metrics::routes())
        .with_state(state)
}
