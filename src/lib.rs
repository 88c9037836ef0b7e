//! Circuit breaker with a background recovery probe.
//!
//! A [`Breaker`] wraps a fallible async operation. After more than `threshold`
//! consecutive failures it stops calling the operation, fails fast, and hands the
//! operation to a recovery probe that retries it every `retry_interval`. The probe
//! closes the circuit on success or opens it for good after `retry_max` attempts.

pub mod breaker;
pub mod config;
pub mod observability;
pub mod registry;

pub use breaker::{Breaker, BreakerError, BreakerResult, State};
pub use config::{BreakerSettings, Strategy};
pub use registry::BreakerRegistry;
