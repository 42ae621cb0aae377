use std::{future::Future, time::Duration};

use rand::{Rng, rng};
use tokio::time::sleep;
use tracing::{error, warn};

use crate::dao::storage::StorageResult;

/// Bounded exponential backoff applied to store calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay after the first failure; doubled after each further failure.
    pub base_delay: Duration,
    /// Upper bound of a single delay.
    pub max_delay: Duration,
    /// Add up to 50% random extra delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Delay slept after the failed attempt with 0-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        if self.jitter && !delay.is_zero() {
            let extra_ms = rng().random_range(0..=delay.as_millis() as u64 / 2);
            delay + Duration::from_millis(extra_ms)
        } else {
            delay
        }
    }
}

/// Run `op` until it succeeds, fails permanently or runs out of attempts.
///
/// Only [`StorageError::Transient`](crate::dao::storage::StorageError::Transient)
/// failures are retried; there is no sleep after the last attempt.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut op: F,
) -> StorageResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StorageResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) => {
                attempt += 1;
                if attempt >= max_attempts {
                    error!(operation, attempts = attempt, error = %err, "store operation failed after retries");
                    return Err(err);
                }
                let delay = policy.delay_for(attempt - 1);
                warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "store operation failed; retrying"
                );
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::storage::StorageError;
    use std::{
        io,
        sync::atomic::{AtomicU32, Ordering},
    };
    use tokio::time::Instant;

    fn transient() -> StorageError {
        StorageError::transient(
            "timeout".into(),
            io::Error::new(io::ErrorKind::TimedOut, "timed out"),
        )
    }

    #[test]
    fn delays_double_up_to_the_cap() {
        let policy = RetryPolicy {
            max_attempts: 6,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            jitter: false,
        };
        let delays: Vec<_> = (0..5).map(|n| policy.delay_for(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 5, 5]);
    }

    #[test]
    fn jitter_stays_within_half_the_delay() {
        let policy = RetryPolicy {
            jitter: true,
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_secs(3));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_with_backoff() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = with_retry(&RetryPolicy::default(), "list_fixtures", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err(transient()) } else { Ok(n) } }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts_without_trailing_sleep() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: StorageResult<()> = with_retry(&RetryPolicy::default(), "list_fixtures", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;

        assert!(result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failures_are_not_retried() {
        let calls = AtomicU32::new(0);

        let result: StorageResult<()> = with_retry(&RetryPolicy::default(), "update_fixture", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(StorageError::permanent(
                    "bad request".into(),
                    io::Error::new(io::ErrorKind::InvalidData, "bad"),
                ))
            }
        })
        .await;

        assert!(!result.unwrap_err().is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
