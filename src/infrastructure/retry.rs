//! Retry/backoff executor for idempotent remote operations
//!
//! A single combinator replaces per-call-site retry loops: transient
//! failures are retried with exponential backoff plus jitter, terminal
//! failures (not-found, malformed payload) pass straight through.
//! Exhausting the attempt budget fails only the wrapped operation.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::infrastructure::api_error::{ApiError, ApiResult};
use crate::infrastructure::config::SyncConfig;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_sync_config(config: &SyncConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    /// Delay before the retry following failed attempt number `attempt`
    /// (zero-based): `base * 2^attempt` plus jitter, capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        let jitter = Duration::from_millis(fastrand::u64(0..250));
        exponential.saturating_add(jitter).min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails terminally, or the attempt
    /// budget is spent. `label` only decorates the retry logs.
    pub async fn execute<T, F, Fut>(&self, label: &str, operation: F) -> ApiResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    attempt += 1;
                    if attempt >= attempts {
                        warn!("{label}: giving up after {attempts} attempts: {err}");
                        return Err(err);
                    }
                    let delay = self.backoff_delay(attempt - 1);
                    warn!(
                        "{label}: attempt {attempt}/{attempts} failed, retrying in {delay:?}: {err}"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
        }
    }

    fn transient(url: &str) -> ApiError {
        ApiError::Status {
            status: 503,
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = quick_policy()
            .execute("op", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient("u"))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: ApiResult<()> = quick_policy()
            .execute("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ApiError::NotFound {
                    url: "u".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(ApiError::NotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_attempt_budget_then_fails() {
        let calls = AtomicU32::new(0);
        let result: ApiResult<()> = quick_policy()
            .execute("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(transient("u"))
            })
            .await;

        assert!(matches!(result, Err(ApiError::Status { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn backoff_grows_exponentially_up_to_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        };
        // Jitter adds at most 250ms on top of the exponential term.
        assert!(policy.backoff_delay(0) >= Duration::from_secs(1));
        assert!(policy.backoff_delay(0) < Duration::from_millis(1250));
        assert!(policy.backoff_delay(2) >= Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(10), Duration::from_secs(8));
    }
}
