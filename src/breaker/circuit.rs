//! The breaker decorator.
//!
//! # Responsibilities
//! - Run the wrapped operation while Closed and count consecutive failures
//! - Trip to HalfOpen once failures exceed the threshold and spawn the probe
//! - Fail fast while HalfOpen or Open
//! - Own the probe task so it can be cancelled by `reset()` or drop

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::breaker::error::{BreakerError, BreakerResult};
use crate::breaker::probe;
use crate::breaker::state::{AtomicState, State};
use crate::config::Strategy;
use crate::observability::metrics;
use crate::observability::{AlertSink, TracingAlertSink};

/// State shared between a breaker and its probe task.
pub(crate) struct Shared {
    pub(crate) name: String,
    pub(crate) strategy: Strategy,
    pub(crate) state: AtomicState,
    pub(crate) consecutive_errors: AtomicUsize,
    alerts: Arc<dyn AlertSink>,
}

impl Shared {
    pub(crate) fn open_message(&self) -> String {
        format!("{} circuit breaker open", self.name)
    }

    pub(crate) fn raise_open_alert(&self) {
        self.alerts.alert(&self.name, &self.open_message());
    }
}

/// Circuit breaker around a fallible async operation.
///
/// ```no_run
/// use std::time::Duration;
/// use circuit_breaker::{Breaker, Strategy};
///
/// # async fn example() {
/// let breaker = Breaker::new("inventory", Strategy::new(2, Duration::from_secs(1), 5));
///
/// let result = breaker
///     .execute(|| async { Ok::<_, std::io::Error>("stock: 12") })
///     .await;
/// assert_eq!(result.unwrap(), "stock: 12");
/// # }
/// ```
pub struct Breaker {
    shared: Arc<Shared>,
    probe: Mutex<Option<JoinHandle<()>>>,
}

impl Breaker {
    /// Create a breaker that reports alerts through `tracing`.
    pub fn new(name: impl Into<String>, strategy: Strategy) -> Self {
        Self::with_alert_sink(name, strategy, Arc::new(TracingAlertSink))
    }

    /// Create a breaker with a custom alert sink.
    pub fn with_alert_sink(
        name: impl Into<String>,
        strategy: Strategy,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let name = name.into();
        tracing::debug!(
            breaker = %name,
            threshold = strategy.threshold(),
            retry_interval_ms = strategy.retry_interval().as_millis() as u64,
            retry_max = strategy.retry_max(),
            "Circuit breaker created"
        );

        Self {
            shared: Arc::new(Shared {
                name,
                strategy,
                state: AtomicState::new(),
                consecutive_errors: AtomicUsize::new(0),
                alerts,
            }),
            probe: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> State {
        self.shared.state.load()
    }

    pub fn strategy(&self) -> &Strategy {
        &self.shared.strategy
    }

    /// Current run of failures observed while Closed.
    pub fn consecutive_errors(&self) -> usize {
        self.shared.consecutive_errors.load(Ordering::Acquire)
    }

    /// Whether a recovery probe task is still alive.
    pub fn is_probing(&self) -> bool {
        self.probe
            .lock()
            .expect("probe handle mutex poisoned")
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Run `operation` under the breaker.
    ///
    /// While Closed the operation runs on the caller's task and its error is returned
    /// as [`BreakerError::Operation`]. While HalfOpen or Open the operation is not
    /// invoked at all.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> BreakerResult<T, E>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        match self.shared.state.load() {
            State::Closed => {}
            State::HalfOpen => {
                metrics::record_rejection(&self.shared.name, State::HalfOpen);
                return Err(BreakerError::Recovering {
                    name: self.shared.name.clone(),
                });
            }
            State::Open => {
                metrics::record_rejection(&self.shared.name, State::Open);
                self.shared.raise_open_alert();
                return Err(BreakerError::Open {
                    name: self.shared.name.clone(),
                });
            }
        }

        match operation().await {
            Ok(value) => {
                self.shared.consecutive_errors.store(0, Ordering::Release);
                Ok(value)
            }
            Err(e) => {
                let failures = self.shared.consecutive_errors.fetch_add(1, Ordering::AcqRel) + 1;
                if failures > self.shared.strategy.threshold() as usize {
                    self.trip(failures, operation);
                }
                Err(BreakerError::Operation(e))
            }
        }
    }

    /// External intervention: back to Closed, counter cleared, probe cancelled.
    pub fn reset(&self) {
        let previous = self.shared.state.reset();
        self.shared.consecutive_errors.store(0, Ordering::Release);
        self.abort_probe();

        tracing::info!(breaker = %self.shared.name, from = %previous, "Circuit breaker reset");
        if previous != State::Closed {
            metrics::record_transition(&self.shared.name, State::Closed);
        }
    }

    fn trip<F, Fut, T, E>(&self, failures: usize, operation: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        // Concurrent callers past the threshold race here; one spawns the probe.
        let Some(generation) = self.shared.state.trip() else {
            return;
        };

        tracing::warn!(
            breaker = %self.shared.name,
            failures,
            threshold = self.shared.strategy.threshold(),
            "Failure threshold exceeded, circuit half open"
        );
        metrics::record_transition(&self.shared.name, State::HalfOpen);

        let handle = tokio::spawn(probe::run(Arc::clone(&self.shared), generation, operation));
        let previous = self
            .probe
            .lock()
            .expect("probe handle mutex poisoned")
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn abort_probe(&self) {
        if let Some(handle) = self.probe.lock().expect("probe handle mutex poisoned").take() {
            handle.abort();
        }
    }
}

impl Drop for Breaker {
    fn drop(&mut self) {
        if let Ok(slot) = self.probe.get_mut() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

impl fmt::Debug for Breaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Breaker")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .field("consecutive_errors", &self.consecutive_errors())
            .field("strategy", &self.shared.strategy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::error::RECOVERING_MESSAGE;
    use crate::observability::RecordingAlertSink;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    fn strategy(threshold: i64) -> Strategy {
        Strategy::new(threshold, Duration::from_secs(1), 5)
    }

    async fn fail(breaker: &Breaker) -> BreakerResult<&'static str, String> {
        breaker
            .execute(|| async { Err::<&'static str, _>("i like to fail".to_string()) })
            .await
    }

    async fn succeed(breaker: &Breaker) -> BreakerResult<&'static str, String> {
        breaker.execute(|| async { Ok::<_, String>("yay") }).await
    }

    #[tokio::test]
    async fn test_closed_passes_result_through() {
        let breaker = Breaker::new("test", strategy(2));

        assert_eq!(succeed(&breaker).await.unwrap(), "yay");

        let err = fail(&breaker).await.unwrap_err();
        assert_eq!(err.operation().map(String::as_str), Some("i like to fail"));
        assert_eq!(breaker.consecutive_errors(), 1);
        assert_eq!(breaker.state(), State::Closed);
    }

    #[tokio::test]
    async fn test_success_resets_counter() {
        let breaker = Breaker::new("test", strategy(2));

        fail(&breaker).await.unwrap_err();
        fail(&breaker).await.unwrap_err();
        assert_eq!(breaker.consecutive_errors(), 2);

        succeed(&breaker).await.unwrap();
        assert_eq!(breaker.consecutive_errors(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tripping_call_returns_operation_error() {
        let breaker = Breaker::new("test", strategy(2));

        fail(&breaker).await.unwrap_err();
        fail(&breaker).await.unwrap_err();
        let tripping = fail(&breaker).await.unwrap_err();

        assert!(!tripping.is_rejected());
        assert_eq!(breaker.state(), State::HalfOpen);
        assert!(breaker.is_probing());

        let err = fail(&breaker).await.unwrap_err();
        assert_eq!(err.to_string(), RECOVERING_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_never_invokes_operation() {
        let breaker = Breaker::new("test", Strategy::new(1, Duration::from_secs(60), 5));
        fail(&breaker).await.unwrap_err();
        fail(&breaker).await.unwrap_err();
        assert_eq!(breaker.state(), State::HalfOpen);

        let calls = Arc::new(AtomicU32::new(0));
        for _ in 0..10 {
            let calls = Arc::clone(&calls);
            let result = breaker
                .execute(move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>(())
                    }
                })
                .await;
            assert!(matches!(result, Err(BreakerError::Recovering { .. })));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_alerts_on_every_call() {
        let sink = Arc::new(RecordingAlertSink::new());
        let breaker = Breaker::with_alert_sink(
            "test",
            Strategy::new(1, Duration::from_secs(1), 1),
            sink.clone(),
        );

        fail(&breaker).await.unwrap_err();
        fail(&breaker).await.unwrap_err();
        // Attempts 0 and 1 fail, then attempts > retry_max opens the circuit
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(breaker.state(), State::Open);
        assert_eq!(sink.alerts().len(), 1);

        for _ in 0..2 {
            let err = succeed(&breaker).await.unwrap_err();
            assert!(matches!(err, BreakerError::Open { ref name } if name == "test"));
            assert_eq!(err.to_string(), "test circuit breaker open");
        }
        assert_eq!(sink.alerts(), vec!["test circuit breaker open"; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_leaves_open_and_cancels_probe() {
        let breaker = Breaker::new("test", Strategy::new(1, Duration::from_secs(30), 5));
        fail(&breaker).await.unwrap_err();
        fail(&breaker).await.unwrap_err();
        assert!(breaker.is_probing());

        breaker.reset();
        assert_eq!(breaker.state(), State::Closed);
        assert_eq!(breaker.consecutive_errors(), 0);
        assert!(!breaker.is_probing());

        assert_eq!(succeed(&breaker).await.unwrap(), "yay");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_probe() {
        let calls = Arc::new(AtomicU32::new(0));
        let breaker = Breaker::new("test", Strategy::new(1, Duration::from_secs(1), 5));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            let _ = breaker
                .execute(move || {
                    let calls = Arc::clone(&calls);
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err::<(), _>("down".to_string())
                    }
                })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        drop(breaker);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_debug_output() {
        let breaker = Breaker::new("inventory", Strategy::default());
        let debug = format!("{:?}", breaker);
        assert!(debug.contains("inventory"));
        assert!(debug.contains("Closed"));
    }
}
