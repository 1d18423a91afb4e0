//! Retry policy for transient backend errors
//!
//! Wraps backend calls with exponential backoff plus jitter. Non-retryable
//! and retry-exhausted errors propagate unchanged, preserving the backend's
//! identifying error name.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::{Result, TrellisError};

/// Backend error names that are safe to retry by default
pub const DEFAULT_RETRYABLE_ERRORS: &[&str] = &[
    "ProvisionedThroughputExceededException",
    "ThrottlingException",
    "RequestLimitExceeded",
    "InternalServerError",
    "ServiceUnavailable",
];

/// Exponential backoff retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles per attempt
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Error names (substring match) considered transient
    pub retryable_errors: Vec<String>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            retryable_errors: DEFAULT_RETRYABLE_ERRORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RetryPolicy {
    fn is_retryable(&self, err: &TrellisError) -> bool {
        match err.backend_name() {
            Some(name) => self.retryable_errors.iter().any(|r| name.contains(r.as_str())),
            None => false,
        }
    }

    /// Exponential delay for the given 1-based attempt, with up to 30% jitter
    fn delay_for(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.as_millis() as f64 * 2f64.powi(attempt as i32 - 1);
        let jitter = rand::thread_rng().gen::<f64>() * 0.3 * exponential;
        let capped = (exponential + jitter).min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Run `f`, retrying transient failures up to `max_attempts` total tries
    pub async fn run<T, F, Fut>(&self, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.max_attempts || !self.is_retryable(&err) {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "retrying transient backend error: {err}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
