//! Bounded retry with a fixed backoff schedule.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Delay used when the schedule is empty.
const FALLBACK_DELAY: Duration = Duration::from_secs(5);

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    /// Delay before the 1st, 2nd, ... retry. Saturates at the last entry.
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delays: vec![
                Duration::from_secs(5),
                Duration::from_secs(20),
                Duration::from_secs(60),
            ],
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-indexed).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let idx = usize::try_from(retry).unwrap_or(usize::MAX);
        match self.delays.get(idx).or_else(|| self.delays.last()) {
            Some(d) => *d,
            None => FALLBACK_DELAY,
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("{label}: cancelled while waiting to retry")]
    Cancelled { label: String },

    #[error("{label}: all {attempts} attempts failed: {source}")]
    Exhausted {
        label: String,
        attempts: u32,
        #[source]
        source: E,
    },
}

impl<E> RetryError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Run `operation` until it succeeds or the policy is exhausted.
///
/// The closure receives the 0-indexed attempt number. The wait before each
/// retry ends early when `token` is cancelled.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    token: &CancellationToken,
    label: &str,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        if token.is_cancelled() {
            return Err(RetryError::Cancelled {
                label: label.to_string(),
            });
        }

        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= policy.max_retries {
            return Err(RetryError::Exhausted {
                label: label.to_string(),
                attempts: attempt + 1,
                source: err,
            });
        }

        let delay = policy.delay_for_retry(attempt);
        warn!(
            label,
            attempt = attempt + 1,
            max = policy.total_attempts(),
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Attempt failed, retrying"
        );

        tokio::select! {
            _ = token.cancelled() => {
                return Err(RetryError::Cancelled { label: label.to_string() });
            }
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }
}
