//! Circuit breaker subsystem.
//!
//! # Data Flow
//! ```text
//! execute(operation):
//!     → state.rs (Closed? HalfOpen? Open?)
//!     → Closed: run operation, count failures (circuit.rs)
//!         → failures > threshold: trip, spawn probe.rs
//!     → HalfOpen: BreakerError::Recovering
//!     → Open: alert sink + BreakerError::Open
//!
//! probe.rs (detached task):
//!     sleep(retry_interval) → operation()
//!     → success: HalfOpen → Closed
//!     → attempts > retry_max: HalfOpen → Open
//! ```
//!
//! # Design Decisions
//! - Lock-free hot path: state is a single atomic word, transitions are CAS
//! - At most one probe per breaker; the trip CAS decides who spawns it
//! - Open is terminal until `reset()`

mod circuit;
pub mod error;
mod probe;
pub mod state;

pub use circuit::Breaker;
pub use error::{BreakerError, BreakerResult};
pub use state::State;
