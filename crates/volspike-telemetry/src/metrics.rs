//! Prometheus metrics for volspike.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A failure means duplicate metric
//! names, which can only happen at static initialization.

use crate::error::{TelemetryError, TelemetryResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, Encoder,
    IntCounter, IntGauge, TextEncoder,
};

/// Completed poll cycles across all sessions.
pub static CYCLES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("volspike_cycles_total", "Completed poll cycles").unwrap()
});

/// Alerts emitted.
/// Labels: symbol
pub static ALERTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "volspike_alerts_total",
        "Volume alerts emitted",
        &["symbol"]
    )
    .unwrap()
});

/// Fetch failures.
/// Labels: stage (ranking/kline)
pub static FETCH_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "volspike_fetch_errors_total",
        "Upstream fetch failures",
        &["stage"]
    )
    .unwrap()
});

/// Alert or notification delivery failures.
pub static DELIVERY_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "volspike_delivery_errors_total",
        "Failed alert sink deliveries"
    )
    .unwrap()
});

/// Monitoring loops currently running.
pub static ACTIVE_SESSIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("volspike_active_sessions", "Running monitoring loops").unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    pub fn cycle_completed() {
        CYCLES_TOTAL.inc();
    }

    pub fn alert_emitted(symbol: &str) {
        ALERTS_TOTAL.with_label_values(&[symbol]).inc();
    }

    /// Record a fetch failure at `stage` ("ranking" or "kline").
    pub fn fetch_error(stage: &str) {
        FETCH_ERRORS_TOTAL.with_label_values(&[stage]).inc();
    }

    pub fn delivery_error() {
        DELIVERY_ERRORS_TOTAL.inc();
    }

    pub fn session_started() {
        ACTIVE_SESSIONS.inc();
    }

    pub fn session_ended() {
        ACTIVE_SESSIONS.dec();
    }

    pub fn active_sessions() -> i64 {
        ACTIVE_SESSIONS.get()
    }

    /// Render all registered metrics in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
