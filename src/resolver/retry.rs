//! Fixed-delay retry for remote reference lookups
//!
//! Whether to retry is decided by the error's [`RetryDecision`], never by
//! inspecting its message.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Same attempt budget, no waiting (for tests)
    pub fn immediate(max_attempts: u32) -> Self {
        Self::fixed(max_attempts, Duration::ZERO)
    }
}

/// Retry classification for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Transient failure, try again after the policy delay
    Retry,
    /// Permanent failure
    NoRetry,
}

/// Trait for errors that can indicate whether to retry
pub trait RetryableError {
    fn retry_decision(&self) -> RetryDecision;
}

/// Execute an async operation with retry logic
///
/// Returns the first success, the first non-retryable error, or the last
/// retryable error once `max_attempts` is spent.
pub async fn with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + std::fmt::Display,
{
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => match e.retry_decision() {
                RetryDecision::NoRetry => {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "Operation failed with non-retryable error: {}",
                        e
                    );
                    return Err(e);
                }
                RetryDecision::Retry => {
                    if attempt >= policy.max_attempts {
                        warn!(
                            operation = operation_name,
                            attempts = attempt,
                            "Operation failed after {} attempts: {}",
                            attempt,
                            e
                        );
                        return Err(e);
                    }

                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        max_attempts = policy.max_attempts,
                        delay_secs = policy.delay.as_secs_f64(),
                        "Retrying after error: {}",
                        e
                    );

                    sleep(policy.delay).await;
                    attempt += 1;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(2));
    }

    #[test]
    fn test_fixed_needs_one_attempt() {
        assert_eq!(RetryPolicy::fixed(0, Duration::ZERO).max_attempts, 1);
    }

    #[derive(Debug)]
    struct TestError {
        retryable: bool,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "TestError(retryable={})", self.retryable)
        }
    }

    impl RetryableError for TestError {
        fn retry_decision(&self) -> RetryDecision {
            if self.retryable {
                RetryDecision::Retry
            } else {
                RetryDecision::NoRetry
            }
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_last_attempt() {
        let policy = RetryPolicy::immediate(3);
        let mut attempts = 0;

        let result: Result<&str, TestError> = with_retry(&policy, "test", || {
            attempts += 1;
            let current = attempts;
            async move {
                if current < 3 {
                    Err(TestError { retryable: true })
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let policy = RetryPolicy::immediate(3);
        let mut attempts = 0;

        let result: Result<&str, TestError> = with_retry(&policy, "test", || {
            attempts += 1;
            async move { Err(TestError { retryable: true }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_no_retry_on_permanent_error() {
        let policy = RetryPolicy::immediate(3);
        let mut attempts = 0;

        let result: Result<&str, TestError> = with_retry(&policy, "test", || {
            attempts += 1;
            async move { Err(TestError { retryable: false }) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_attempts() {
        let policy = RetryPolicy::default();
        let started = tokio::time::Instant::now();

        let result: Result<(), TestError> = with_retry(&policy, "test", || async {
            Err(TestError { retryable: true })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }
}
