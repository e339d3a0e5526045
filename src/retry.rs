//! Fixed-delay retry loop.
//!
//! Both the catalog walk and the download engine use the same policy: a bounded
//! number of attempts with a constant pause in between. Whether an error is worth
//! another attempt is decided by [`Error::is_retryable`].

use crate::error::Error;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Attempt bound and pause shared by every retried operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included. Never less than 1.
    pub max_attempts: u32,
    /// Pause between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(10),
        }
    }
}

/// The last error of an operation that did not succeed, with the attempts spent.
#[derive(Debug)]
pub struct Exhausted {
    pub attempts: u32,
    pub error: Error,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// runs out of attempts. The operation receives the 1-based attempt number.
    pub async fn run<F, Fut, T>(&self, what: &str, mut operation: F) -> Result<T, Exhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    warn!(
                        attempt,
                        max_attempts,
                        "{what} failed: {error}. Retrying in {:?}",
                        self.delay
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Err(Exhausted {
                        attempts: attempt,
                        error,
                    })
                }
            }
        }
    }
}
