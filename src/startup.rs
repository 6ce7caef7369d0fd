//! Application startup and server initialization.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ConfigV1;
use crate::metrics::Metrics;
use crate::models::token::SystemClock;
use crate::routes;
use crate::state::AppState;

/// Initializes and runs the edge guard server.
///
/// Binds to the address specified in the configuration and serves the
/// forward-auth, health and metrics routes.
///
/// # Errors
///
/// Returns an error if the server fails to bind to the specified address
/// or encounters a runtime error during execution.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        "Guarding {} public and {} protected prefixes",
        config.guard.public_routes.len(),
        config.guard.protected_routes.len()
    );
    info!("Starting server on {}", config.bind_address);

    let state = AppState {
        config: config.clone(),
        metrics: Metrics::new(),
        clock: Arc::new(SystemClock),
    };

    let app = routes::create_router(state);

    let listener = TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
