use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Backoff schedule for retried operations.
///
/// One attempt is made per entry of `base_delays_ms`, followed by
/// `final_retries` attempts spaced by `final_delay_ms`. At least one attempt
/// is always made.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    #[serde(default = "RetryPolicy::default_base_delays_ms")]
    pub base_delays_ms: Vec<u64>,
    #[serde(default = "RetryPolicy::default_final_retries")]
    pub final_retries: usize,
    #[serde(default = "RetryPolicy::default_final_delay_ms")]
    pub final_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delays_ms: Self::default_base_delays_ms(),
            final_retries: Self::default_final_retries(),
            final_delay_ms: Self::default_final_delay_ms(),
        }
    }
}

impl RetryPolicy {
    fn default_base_delays_ms() -> Vec<u64> {
        vec![200, 400, 800]
    }

    const fn default_final_retries() -> usize {
        2
    }

    const fn default_final_delay_ms() -> u64 {
        1000
    }

    /// A policy that tries exactly once.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            base_delays_ms: Vec::new(),
            final_retries: 0,
            final_delay_ms: 0,
        }
    }

    /// Total number of attempts this policy allows.
    #[must_use]
    pub fn max_attempts(&self) -> usize {
        (self.base_delays_ms.len() + self.final_retries).max(1)
    }

    /// Delay to wait after the failed `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let millis = attempt
            .checked_sub(1)
            .and_then(|i| self.base_delays_ms.get(i))
            .copied()
            .unwrap_or(self.final_delay_ms);
        Duration::from_millis(millis)
    }
}

/// Retry an async operation following `policy`.
///
/// Returns the first success, or the error of the last attempt once the
/// policy is exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "Operation failed (attempt {}/{}): {e}. Retrying after {}ms...",
                    attempt,
                    max_attempts,
                    delay.as_millis()
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            base_delays_ms: vec![1, 2],
            final_retries: 2,
            final_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn retry_succeeds_on_first_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), String>(())
                }
            },
            &fast_policy(),
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_succeeds_after_failures() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: std::result::Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if count < 3 {
                        Err(String::from("fail"))
                    } else {
                        Ok(())
                    }
                }
            },
            &fast_policy(),
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_fails_after_all_attempts() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: std::result::Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(String::from("fail"))
                }
            },
            &fast_policy(),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 4); // 2 base + 2 final
    }

    #[tokio::test]
    async fn no_retry_policy_still_tries_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let result: std::result::Result<(), String> = retry_with_backoff(
            || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(String::from("fail"))
                }
            },
            &RetryPolicy::no_retry(),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delays_fall_back_to_final_delay() {
        let policy = fast_policy();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2));
        assert_eq!(policy.delay_after(3), Duration::from_millis(1));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn partial_policy_uses_defaults() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"final_retries": 5}"#).expect("valid JSON should deserialize");
        assert_eq!(policy.final_retries, 5);
        assert_eq!(policy.base_delays_ms, vec![200, 400, 800]);
        assert_eq!(policy.final_delay_ms, 1000);
    }
}
