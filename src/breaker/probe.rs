//! Recovery probe.
//!
//! # Responsibilities
//! - Re-invoke the tripping operation every `retry_interval` while HalfOpen
//! - Close the circuit on the first success
//! - Open the circuit once attempts exceed `retry_max`
//!
//! # Design Decisions
//! - Uses the caller's own operation, not a synthetic health check
//! - Attempt failures are never surfaced to callers; only the final Open is observable
//! - All transitions are scoped to the generation the probe was spawned for

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::breaker::circuit::Shared;
use crate::breaker::state::{Generation, State};
use crate::observability::metrics;

pub(crate) async fn run<F, Fut, T, E>(shared: Arc<Shared>, generation: Generation, operation: F)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let retry_max = shared.strategy.retry_max();
    let interval = shared.strategy.retry_interval();
    let mut attempts: u32 = 0;

    tracing::info!(
        breaker = %shared.name,
        retry_interval_ms = interval.as_millis() as u64,
        retry_max,
        "Recovery probe started"
    );

    while shared.state.is(generation, State::HalfOpen) {
        if attempts > retry_max {
            if shared.state.transition(generation, State::HalfOpen, State::Open) {
                tracing::warn!(breaker = %shared.name, attempts, "Recovery failed, circuit open");
                metrics::record_transition(&shared.name, State::Open);
                shared.raise_open_alert();
            }
            return;
        }

        tokio::time::sleep(interval).await;

        // reset() may have ended this episode while we slept
        if !shared.state.is(generation, State::HalfOpen) {
            break;
        }

        let recovered = operation().await.is_ok();
        metrics::record_probe_attempt(&shared.name, recovered);

        if recovered {
            if shared.state.transition(generation, State::HalfOpen, State::Closed) {
                shared.consecutive_errors.store(0, Ordering::Release);
                tracing::info!(breaker = %shared.name, attempt = attempts + 1, "Recovery succeeded, circuit closed");
                metrics::record_transition(&shared.name, State::Closed);
            }
            return;
        }

        tracing::debug!(breaker = %shared.name, attempt = attempts + 1, "Recovery attempt failed");
        attempts += 1;
    }

    tracing::debug!(breaker = %shared.name, "Recovery probe superseded");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::Breaker;
    use crate::config::Strategy;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    /// Trip a breaker with an operation that fails `failures` times, then succeeds.
    async fn tripped(strategy: Strategy, failures: u32) -> (Breaker, Arc<AtomicU32>) {
        let breaker = Breaker::new("probe", strategy);
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..=strategy.threshold() {
            let calls = Arc::clone(&calls);
            let _ = breaker
                .execute(move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) < failures {
                            Err("down")
                        } else {
                            Ok(())
                        }
                    }
                })
                .await;
        }
        assert_eq!(breaker.state(), State::HalfOpen);
        (breaker, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_spaces_attempts_by_interval() {
        let strategy = Strategy::new(1, Duration::from_secs(2), 5);
        let (breaker, calls) = tripped(strategy, u32::MAX).await;

        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(breaker.state(), State::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_makes_retry_max_plus_one_attempts() {
        let strategy = Strategy::new(1, Duration::from_secs(1), 3);
        let (breaker, calls) = tripped(strategy, u32::MAX).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(breaker.state(), State::Open);
        // Two calls tripped the breaker, then attempts 0..=retry_max
        assert_eq!(calls.load(Ordering::SeqCst), 2 + 4);
        assert!(!breaker.is_probing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_stops_after_first_success() {
        let strategy = Strategy::new(1, Duration::from_secs(1), 5);
        let (breaker, calls) = tripped(strategy, 3).await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(breaker.state(), State::Closed);
        assert_eq!(breaker.consecutive_errors(), 0);
        // Third call is the failing probe attempt, fourth closes the circuit
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
