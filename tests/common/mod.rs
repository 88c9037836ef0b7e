//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use circuit_breaker::{Breaker, BreakerResult};
use tokio::time::Instant;

pub const FAILURE: &str = "i like to fail";

/// Operation that always fails and counts its invocations.
pub fn failing(
    calls: Arc<AtomicU32>,
) -> impl Fn() -> std::future::Ready<Result<&'static str, String>> + Send + Sync + 'static {
    move || {
        calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Err(FAILURE.to_string()))
    }
}

/// Operation that fails until `fail_for` has passed since `started`, then returns "yay".
#[allow(dead_code)]
pub fn failing_for(
    started: Instant,
    fail_for: Duration,
) -> impl Fn() -> std::future::Ready<Result<&'static str, String>> + Send + Sync + 'static {
    move || {
        if started.elapsed() > fail_for {
            std::future::ready(Ok("yay"))
        } else {
            std::future::ready(Err(FAILURE.to_string()))
        }
    }
}

/// Call `breaker` `times` times with an always-failing operation.
#[allow(dead_code)]
pub async fn fail_times(breaker: &Breaker, times: u32) -> Vec<BreakerResult<&'static str, String>> {
    let calls = Arc::new(AtomicU32::new(0));
    let mut results = Vec::new();
    for _ in 0..times {
        results.push(breaker.execute(failing(Arc::clone(&calls))).await);
    }
    results
}
