//! Metrics recording implementation using Prometheus.

use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
    register_int_counter_with_registry, CounterVec, Encoder, HistogramVec, IntCounter, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

/// Trait for recording application metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records a navigation verdict ("allow", "dashboard", "login", "unauthorized").
    fn record_verdict(&self, verdict: &str);

    /// Records a refresh attempt with its outcome.
    fn record_refresh(&self, result: &str);

    /// Records the duration of a refresh round trip.
    fn record_refresh_duration(&self, duration_secs: f64, result: &str);

    /// Records a request parked behind an in-flight refresh.
    fn record_refresh_waiter(&self);
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Route guard metrics
    guard_verdicts_total: CounterVec,

    // Refresh metrics
    refresh_attempts_total: CounterVec,
    refresh_duration_seconds: HistogramVec,
    refresh_waiters_total: IntCounter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Creates a new metrics instance with a Prometheus registry.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        // Route guard metrics
        let guard_verdicts_total = register_counter_vec_with_registry!(
            Opts::new(
                "guard_verdicts_total",
                "Total number of navigation verdicts by outcome"
            ),
            &["verdict"],
            registry.clone()
        )
        .expect("Failed to register guard_verdicts_total");

        // Refresh metrics
        let refresh_attempts_total = register_counter_vec_with_registry!(
            Opts::new(
                "refresh_attempts_total",
                "Total number of credential refresh attempts"
            ),
            &["result"],
            registry.clone()
        )
        .expect("Failed to register refresh_attempts_total");

        let refresh_duration_seconds = register_histogram_vec_with_registry!(
            "refresh_duration_seconds",
            "Credential refresh duration in seconds",
            &["result"],
            vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            registry.clone()
        )
        .expect("Failed to register refresh_duration_seconds");

        let refresh_waiters_total = register_int_counter_with_registry!(
            Opts::new(
                "refresh_waiters_total",
                "Total number of requests queued behind an in-flight refresh"
            ),
            registry.clone()
        )
        .expect("Failed to register refresh_waiters_total");

        Metrics {
            registry,
            guard_verdicts_total,
            refresh_attempts_total,
            refresh_duration_seconds,
            refresh_waiters_total,
        }
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl MetricsRecorder for Metrics {
    fn record_verdict(&self, verdict: &str) {
        self.guard_verdicts_total.with_label_values(&[verdict]).inc();
    }

    fn record_refresh(&self, result: &str) {
        self.refresh_attempts_total.with_label_values(&[result]).inc();
    }

    fn record_refresh_duration(&self, duration_secs: f64, result: &str) {
        self.refresh_duration_seconds
            .with_label_values(&[result])
            .observe(duration_secs);
    }

    fn record_refresh_waiter(&self) {
        self.refresh_waiters_total.inc();
    }
}
