//! Fixed-interval retry policy.
//!
//! # Responsibilities
//! - Re-run a fallible async operation at a fixed interval
//! - Log every failed attempt with its attempt counter
//! - Stop only on success, or when an optional attempt cap is reached
//!
//! # Design Decisions
//! - Unbounded by default: startup has no useful work without the broker
//! - The cap exists so tests and one-shot tools can bound the wait

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::config::RetryConfig;

/// Returned when a bounded policy runs out of attempts.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {last_error}")]
pub struct RetryExhausted<E: std::fmt::Display> {
    pub attempts: u32,
    pub last_error: E,
}

/// How often, and how many times, to retry an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    interval: Duration,
    max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Retry forever, sleeping `interval` between attempts.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Cap the total number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Whether a further attempt is permitted after `attempts` have run.
    pub fn allows_another(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }

    /// Run `operation` until it succeeds or the policy is exhausted.
    ///
    /// The closure receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation: &str,
        mut attempt_fn: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        E: std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match attempt_fn(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(operation, attempt, "Succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    if !self.allows_another(attempt) {
                        tracing::error!(operation, attempt, error = %e, "Giving up");
                        return Err(RetryExhausted {
                            attempts: attempt,
                            last_error: e,
                        });
                    }
                    tracing::warn!(
                        operation,
                        attempt,
                        error = %e,
                        retry_in = ?self.interval,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
