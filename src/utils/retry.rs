//! Bounded retry with exponential backoff for transient failures.
//!
//! Only errors for which [`AppError::is_transient`] holds are retried; every
//! other error is returned immediately. Each attempt runs under a timeout and a
//! timed-out attempt counts as a transient failure.
//!
//! Use this for reads and for operations that are idempotent by construction
//! (booking decisions). Plain inserts must not go through it.

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            attempt_timeout: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: RetryPolicy::default(),
        }
    }

    /// No retries, same timeout.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// delay = initial_delay * multiplier^attempt, capped at max_delay
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exp);
        if !millis.is_finite() || millis >= self.max_delay.as_millis() as f64 {
            return self.max_delay;
        }
        Duration::from_millis(millis as u64)
    }

    pub async fn run<F, Fut, T>(&self, label: &str, mut operation: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.attempt_timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(AppError::Transient(format!(
                    "{label} timed out after {:?}",
                    self.attempt_timeout
                ))),
            };

            match result {
                Ok(value) => {
                    if attempt > 0 {
                        log::info!("{label} succeeded after {attempt} retries");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for_attempt(attempt);
                    log::warn!(
                        "{label} failed transiently (attempt {}), retrying in {delay:?}: {err}",
                        attempt + 1
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        log::error!("{label} failed after {} attempts: {err}", attempt + 1);
                    }
                    return Err(err);
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.policy.max_retries = max_retries;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.policy.initial_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.policy.multiplier = multiplier;
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.policy.attempt_timeout = timeout;
        self
    }

    pub fn build(self) -> RetryPolicy {
        self.policy
    }
}
