//! Alert sink for open breakers.
//!
//! The breaker only formats the message; where it ends up (console, log pipeline,
//! pager) is decided by the [`AlertSink`] implementation.

use std::sync::Mutex;

/// Target used by [`TracingAlertSink`] so alerts can be routed separately.
pub const ALERT_TARGET: &str = "circuit_breaker::alert";

/// Receiver of alert-level diagnostics.
pub trait AlertSink: Send + Sync + 'static {
    fn alert(&self, breaker: &str, message: &str);
}

/// Default sink: an `error` event on the [`ALERT_TARGET`] target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn alert(&self, breaker: &str, message: &str) {
        tracing::error!(target: ALERT_TARGET, breaker = %breaker, "ALERT: {}", message);
    }
}

/// Sink that keeps every alert in memory.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<String>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages received so far, oldest first.
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().expect("alert sink mutex poisoned").clone()
    }
}

impl AlertSink for RecordingAlertSink {
    fn alert(&self, _breaker: &str, message: &str) {
        self.alerts
            .lock()
            .expect("alert sink mutex poisoned")
            .push(message.to_string());
    }
}
