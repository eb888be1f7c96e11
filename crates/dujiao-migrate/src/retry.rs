//! Fixed-delay retry for remote calls.
//!
//! Every call against the new API runs under this policy: a configured
//! number of attempts with a fixed pause between them, fully exhausted
//! before the last error surfaces. Slug-conflict retries in the
//! orchestrator are layered on top and independent of this.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Retry behavior for network operations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts (the initial try included). Zero is
    /// treated as one.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy from the configured attempt count and delay seconds.
    #[must_use]
    pub fn new(attempts: u32, delay_secs: u64) -> Self {
        Self {
            attempts,
            delay: Duration::from_secs(delay_secs),
        }
    }

    /// A single attempt, no pauses. Used in tests and validation paths.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Runs `operation` until it succeeds or the policy is exhausted.
///
/// # Errors
///
/// Returns [`Error::RetriesExhausted`] wrapping the last error once every
/// attempt has failed.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            debug!(
                "{}: attempt {}/{} after {:?}",
                operation_name,
                attempt + 1,
                attempts,
                policy.delay
            );
            sleep(policy.delay).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!("{}: succeeded on attempt {}", operation_name, attempt + 1);
                }
                return Ok(result);
            }
            Err(e) => {
                warn!(
                    "{}: attempt {}/{} failed: {}",
                    operation_name,
                    attempt + 1,
                    attempts,
                    e
                );
                last_error = Some(e);
            }
        }
    }

    Err(Error::RetriesExhausted {
        operation: operation_name.to_string(),
        attempts,
        source: Box::new(
            last_error.unwrap_or_else(|| Error::Api("no attempts were made".to_string())),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_with_retry_success_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_retry(&RetryPolicy::no_retry(), "op", || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_success_after_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_retry(&fast_policy(3), "op", || {
            let calls = calls_clone.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::Api("temporary".to_string()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_exhaustion_reports_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32> = with_retry(&fast_policy(2), "op", || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Api("still down".to_string()))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match result {
            Err(Error::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = with_retry(&fast_policy(0), "op", || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(())
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
