//! Retry execution for upstream calls.
//!
//! # State Transitions
//! ```text
//! ATTEMPTING → SUCCEEDED:        call returned Ok
//! ATTEMPTING → FAILED_PERMANENT: 4xx other than 429
//! ATTEMPTING → WAITING:          transient failure, attempts remain
//! WAITING    → ATTEMPTING:       after base * 2^attempt_index
//! ATTEMPTING → FAILED_EXHAUSTED: transient failure on the last attempt
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;

/// Whether a failure is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Permanent,
    Transient,
}

/// Classify a failure by its HTTP-like status code.
pub fn classify_status(status: Option<u16>) -> FailureClass {
    match status {
        Some(429) => FailureClass::Transient,
        Some(400..=499) => FailureClass::Permanent,
        _ => FailureClass::Transient,
    }
}

/// Errors that can be classified for retry purposes.
pub trait RetryClassify {
    /// HTTP-like status carried by the error, if any.
    fn status_code(&self) -> Option<u16>;

    fn is_permanent(&self) -> bool {
        classify_status(self.status_code()) == FailureClass::Permanent
    }
}

/// Exponential backoff retry policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        if !config.enabled {
            return Self::new(1, config.base_delay_ms, config.max_delay_ms);
        }
        Self::new(config.max_attempts, config.base_delay_ms, config.max_delay_ms)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay between attempt `attempt_index` and the next one.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        calculate_backoff(attempt_index, self.base_delay_ms, self.max_delay_ms)
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// The error of the final attempt is returned unchanged.
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryClassify + fmt::Display,
    {
        let mut attempt_index = 0;
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if error.is_permanent() {
                tracing::debug!(
                    attempt = attempt_index + 1,
                    status = ?error.status_code(),
                    error = %error,
                    "Permanent failure, not retrying"
                );
                return Err(error);
            }

            if attempt_index + 1 >= self.max_attempts {
                tracing::warn!(
                    attempts = self.max_attempts,
                    error = %error,
                    "Retries exhausted"
                );
                return Err(error);
            }

            let delay = self.delay_for(attempt_index);
            tracing::info!(
                attempt = attempt_index + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying upstream call"
            );
            metrics::record_retry(error.status_code());
            tokio::time::sleep(delay).await;
            attempt_index += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BASE_DELAY_MS, 30_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[derive(Debug)]
    enum TestError {
        Status(u16),
        Network,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                TestError::Status(s) => write!(f, "status {}", s),
                TestError::Network => write!(f, "connection reset"),
            }
        }
    }

    impl RetryClassify for TestError {
        fn status_code(&self) -> Option<u16> {
            match self {
                TestError::Status(s) => Some(*s),
                TestError::Network => None,
            }
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify_status(Some(400)), FailureClass::Permanent);
        assert_eq!(classify_status(Some(404)), FailureClass::Permanent);
        assert_eq!(classify_status(Some(499)), FailureClass::Permanent);
        assert_eq!(classify_status(Some(429)), FailureClass::Transient);
        assert_eq!(classify_status(Some(500)), FailureClass::Transient);
        assert_eq!(classify_status(Some(399)), FailureClass::Transient);
        assert_eq!(classify_status(None), FailureClass::Transient);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let start = Instant::now();

        let result: Result<(), TestError> = policy
            .execute(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Status(404))
            })
            .await;

        assert!(matches!(result, Err(TestError::Status(404))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_two_network_errors() {
        let policy = RetryPolicy::new(3, 1000, 30_000);
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let start = Instant::now();

        let result = policy
            .execute(|| async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(TestError::Network)
                } else {
                    Ok("listed")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "listed");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(3000), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(3100), "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let policy = RetryPolicy::new(4, 1000, 30_000);
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let start = Instant::now();

        let result: Result<(), TestError> = policy
            .execute(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Status(503))
            })
            .await;

        assert!(matches!(result, Err(TestError::Status(503))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 1s + 2s + 4s, no wait after the final attempt.
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(7000));
        assert!(waited < Duration::from_millis(7100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttling_is_retried() {
        let policy = RetryPolicy::new(2, 1000, 30_000);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), TestError> = policy
            .execute(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Status(429))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_calls_once() {
        let policy = RetryPolicy::new(0, 1000, 30_000);
        assert_eq!(policy.max_attempts(), 1);

        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), TestError> = policy
            .execute(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Network)
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disabled_config_means_single_attempt() {
        let config = RetryConfig {
            enabled: false,
            ..RetryConfig::default()
        };
        assert_eq!(RetryPolicy::from_config(&config).max_attempts(), 1);
    }
}
