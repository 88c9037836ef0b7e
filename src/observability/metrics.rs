//! Metrics collection and exposition.
//!
//! # Metrics
//! - `circuit_breaker_transitions_total` (counter): state changes by breaker, target state
//! - `circuit_breaker_rejections_total` (counter): calls refused by breaker, state
//! - `circuit_breaker_probe_attempts_total` (counter): probe attempts by breaker, outcome
//! - `circuit_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::breaker::State;

/// Initialize the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

/// Record a state change and update the state gauge.
pub fn record_transition(breaker: &str, to: State) {
    metrics::counter!(
        "circuit_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
    metrics::gauge!("circuit_breaker_state", "breaker" => breaker.to_string()).set(to as u8 as f64);
}

/// Record a call refused without running the operation.
pub fn record_rejection(breaker: &str, state: State) {
    metrics::counter!(
        "circuit_breaker_rejections_total",
        "breaker" => breaker.to_string(),
        "state" => state.to_string()
    )
    .increment(1);
}

/// Record one recovery probe attempt.
pub fn record_probe_attempt(breaker: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(
        "circuit_breaker_probe_attempts_total",
        "breaker" => breaker.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
