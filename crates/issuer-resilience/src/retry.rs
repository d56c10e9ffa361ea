//! Retry policy for transient transport failures.
//!
//! Only timeouts and network errors are retried. Any HTTP status is a
//! definitive answer from the gateway and is handed back on the first attempt.

use issuer_core::GatewayResult;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; later retries wait a multiple of it
    pub base_delay: Duration,
    /// Upper bound for a single delay
    pub max_delay: Duration,
    /// Jitter factor (0.0 - 1.0)
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            jitter: 0.0,
        }
    }
}

/// Retry policy implementation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Policy that makes exactly one attempt
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(RetryConfig {
            max_attempts: 1,
            ..Default::default()
        })
    }

    /// Delay before retry number `retry` (1-indexed), growing linearly
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let delay = self
            .config
            .base_delay
            .saturating_mul(retry.max(1))
            .min(self.config.max_delay);

        if self.config.jitter <= 0.0 {
            return delay;
        }

        let millis = delay.as_millis() as f64;
        let range = millis * self.config.jitter.min(1.0);
        let jittered = millis + rand::thread_rng().gen_range(-range..=range);
        Duration::from_millis(jittered.max(0.0) as u64)
    }

    /// Run `operation`, retrying transient failures.
    ///
    /// # Errors
    /// Returns the first non-retryable error, or the last error once attempts
    /// are exhausted.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, operation: F) -> GatewayResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = GatewayResult<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = %operation_name, attempt, "Retry succeeded");
                    }
                    return Ok(value);
                }
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for_retry(attempt);
                    warn!(
                        operation = %operation_name,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_defaults()
    }
}
