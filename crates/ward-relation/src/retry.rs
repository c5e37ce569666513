//! Bounded retry with exponential backoff.
//!
//! Store operations run under a [`RetryPolicy`]: transient errors are
//! retried with exponentially growing delays, everything else returns
//! immediately. Spent budgets become [`StoreError::Exhausted`] so the
//! caller can log the abandoned mutation with full context.

use crate::error::StoreError;
use std::future::Future;
use std::time::Duration;
use ward_types::ErrorCode;

/// Bounded-attempt retry policy with exponential backoff.
///
/// Delays follow `base_delay * 2^attempt`, capped at `max_delay`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ward_relation::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 5);
/// assert_eq!(policy.backoff(0), Duration::from_millis(500));
/// assert_eq!(policy.backoff(1), Duration::from_secs(1));
/// assert_eq!(policy.backoff(2), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Returns the delay before retrying after the given attempt.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let millis = u64::try_from(self.base_delay.as_millis())
            .unwrap_or(u64::MAX)
            .saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(millis).min(self.max_delay)
    }

    /// Runs `f` until it succeeds, fails unrecoverably, or the attempt
    /// budget is spent.
    ///
    /// Only errors whose [`is_recoverable`](ErrorCode::is_recoverable)
    /// is `true` are retried; conflicts and other terminal errors
    /// return immediately so the caller can handle them.
    ///
    /// # Errors
    ///
    /// - The original error, when it is not recoverable
    /// - [`StoreError::Exhausted`] after `max_attempts` recoverable
    ///   failures
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        mut f: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last = None;
        for attempt in 0..attempts {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_recoverable() => return Err(err),
                Err(err) => {
                    if attempt + 1 < attempts {
                        let delay = self.backoff(attempt);
                        tracing::warn!(
                            operation,
                            attempt = attempt + 1,
                            max_attempts = attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "transient store error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last = Some(err);
                }
            }
        }
        Err(StoreError::Exhausted {
            operation,
            attempts,
            last: last.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::RelationTuple;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(40),
        }
    }

    #[test]
    fn backoff_progression() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert!(policy.backoff(30) <= policy.max_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_without_retry() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run("check", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, StoreError>(true)
            })
            .await;

        assert!(result.expect("should succeed"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run("add_tuple", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StoreError::transient("add_tuple", "reset"))
                } else {
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run("add_tuple", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(StoreError::transient("add_tuple", "reset"))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(StoreError::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn conflict_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run("add_tuple", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(StoreError::conflict(RelationTuple::viewer("bob", "doc")))
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
    }
}
