//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breakers and probes produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!     → alert.rs (alert-level messages while open)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Alert sink chosen by the breaker owner
//! ```

pub mod alert;
pub mod logging;
pub mod metrics;

pub use alert::{AlertSink, RecordingAlertSink, TracingAlertSink};
