//! Bounded retry around a single async step
//!
//! Used for planning calls and transaction submissions. Attempts are immediate
//! by default; the inter-attempt delay is meant for position-lookup polling.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::error::{ExecError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
    call_timeout: Option<Duration>,
}

impl RetryPolicy {
    /// `max_retries` extra attempts after the first one
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            delay: Duration::ZERO,
            call_timeout: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Bound each attempt; an elapsed timeout counts as a retryable failure
    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// Returns the first success, or the last error once all
    /// `max_retries + 1` attempts failed. Non-retryable errors return at once.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = match self.call_timeout {
                Some(limit) => match timeout(limit, op()).await {
                    Ok(result) => result,
                    Err(_) => Err(ExecError::Timeout {
                        operation: operation.to_string(),
                        elapsed_ms: limit.as_millis() as u64,
                    }),
                },
                None => op().await,
            };

            match result {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    warn!(operation, attempts = attempt, error = %e, "giving up");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        error = %e,
                        "attempt failed, retrying"
                    );
                    if !self.delay.is_zero() {
                        sleep(self.delay).await;
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Polling for eventually-consistent reads.
///
/// Unlike `RetryPolicy` the call succeeds every time; polling continues while
/// the result is not yet acceptable, and the last result is returned either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    attempts: u32,
    delay: Duration,
}

impl PollPolicy {
    /// `attempts` total calls (at least one)
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    pub async fn poll<T, F, Fut, P>(&self, operation: &str, mut op: F, ready: P) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&T) -> bool,
    {
        let mut attempt = 1u32;
        loop {
            let value = op().await?;
            if ready(&value) || attempt >= self.attempts {
                if !ready(&value) {
                    debug!(operation, attempts = attempt, "poll budget spent, using last result");
                }
                return Ok(value);
            }

            debug!(operation, attempt, delay_ms = self.delay.as_millis() as u64, "not ready, polling again");
            attempt += 1;
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
        }
    }
}
