//! Bounded retry for idempotent remote reads.

use std::{future::Future, time::Duration};

use crate::{Error, Result};

/// How often and how patiently to retry a transient remote failure.
///
/// Only reads go through a policy. Creation and upload requests are sent once
/// so a lost response can never produce a duplicate remote resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// A policy that sends each request exactly once.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `retry` (starting at zero).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry.min(6)))
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if retry + 1 < attempts && is_retryable(&err) => {
                    let delay = self.delay_for(retry);
                    tracing::warn!(
                        operation = what,
                        attempt = retry + 1,
                        ?delay,
                        "Transient remote failure, retrying: {err}"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn is_retryable(err: &Error) -> bool {
    matches!(err, Error::Remote(remote) if remote.is_transient())
}
