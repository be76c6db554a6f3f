//! 重试策略：对瞬时故障做指数退避重试，尝试次数有确定上限。
//!
//! # Retry Policy
//!
//! Every network call made by the client runs under a [`RetryPolicy`]. An attempt that
//! fails with a transient error (see [`crate::ErrorKind::is_transient`]) is retried
//! after an exponentially growing delay:
//!
//! ```text
//! delay(i) = min(initial_delay * backoff_multiplier^i, max_delay)
//! ```
//!
//! where `i` is the 0-based index of the attempt that just failed. At most
//! `max_retries + 1` attempts are made; after that the last failure is surfaced as
//! [`Error::RetryExhausted`].
//!
//! ```rust
//! use infinispan_rest_client::retry::RetryConfig;
//! use std::time::Duration;
//!
//! let config = RetryConfig::new()
//!     .with_max_retries(2)
//!     .with_initial_delay(Duration::from_millis(100))
//!     .with_backoff_multiplier(2.0)
//!     .with_max_delay(Duration::from_millis(150));
//! assert_eq!(config.delay_for(0), Duration::from_millis(100));
//! assert_eq!(config.delay_for(1), Duration::from_millis(150));
//! ```

use crate::{Error, ErrorContext, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Backoff parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
    /// Upper bound for the whole attempt sequence, sleeps included.
    pub overall_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 5.0,
            max_delay: Duration::from_secs(30),
            overall_timeout: None,
        }
    }
}

impl RetryConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = Some(timeout);
        self
    }

    /// Reject parameters that would make the backoff shrink, stall or be unbounded.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, msg: &str| {
            Err(Error::configuration_with_context(
                msg.to_string(),
                ErrorContext::new()
                    .with_field_path(field)
                    .with_source("retry_config"),
            ))
        };
        if self.initial_delay.is_zero() {
            return invalid("initial_delay", "initial retry delay must be positive");
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier <= 1.0 {
            return invalid(
                "backoff_multiplier",
                "backoff multiplier must be a finite number greater than 1.0",
            );
        }
        if self.max_delay < self.initial_delay {
            return invalid(
                "max_delay",
                "max retry delay must not be smaller than the initial delay",
            );
        }
        Ok(())
    }

    /// Delay to wait after the attempt with 0-based index `attempt` failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs).min(self.max_delay)
    }

    /// Total number of attempts, first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Runs fallible operations under a [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Invoke `op` until it succeeds, fails terminally, or attempts run out.
    ///
    /// `operation` is only used for logging.
    pub async fn execute<T, F, Fut>(&self, operation: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.config.overall_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.run(operation, op)).await {
                Ok(result) => result,
                Err(_) => {
                    error!(
                        operation,
                        timeout_ms = limit.as_millis() as u64,
                        "retry sequence exceeded overall timeout"
                    );
                    Err(Error::timeout_with_context(
                        format!("{} did not complete within {:?}", operation, limit),
                        ErrorContext::new().with_source("retry_policy"),
                    ))
                }
            },
            None => self.run(operation, op).await,
        }
    }

    async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.config.max_attempts();
        let mut attempt: u32 = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            let made = attempt + 1;
            if made >= max_attempts {
                error!(
                    operation,
                    attempts = made,
                    error = %err,
                    "all attempts failed"
                );
                return Err(Error::RetryExhausted {
                    attempts: made,
                    source: Box::new(err),
                });
            }

            let delay = self.config.delay_for(attempt);
            warn!(
                operation,
                attempt = made,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt = made;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            config: RetryConfig::default(),
        }
    }
}
