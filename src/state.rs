//! Shared application state for the edge guard server.

use crate::config::ConfigV1;
use crate::metrics::Metrics;
use crate::models::token::Clock;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Holds no session data: every verdict is computed from the request alone.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Prometheus metrics collector.
    pub metrics: Metrics,
    /// Source of "now" for credential expiry.
    pub clock: Arc<dyn Clock>,
}
