//! Centralized retry-with-backoff for external API calls
//!
//! Every outbound call (embedding, index query, language model, grading)
//! goes through [`retry_with_backoff`] instead of carrying its own loop.

use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Extra multiplier applied to the backoff delay when the remote side
/// reports rate limiting and gives no explicit retry-after hint.
const RATE_LIMIT_FACTOR: u32 = 4;

/// Error classification consumed by the retry loop
pub trait Retryable {
    /// Whether another attempt can reasonably succeed
    fn is_retryable(&self) -> bool;

    /// Whether the error is a rate-limit response (gets extended backoff)
    fn is_rate_limited(&self) -> bool {
        false
    }

    /// Server-suggested delay before the next attempt, if any
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Backoff policy: bounded attempts with exponential delay
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt
    pub backoff_factor: f64,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    /// Delay before attempt `attempt + 1` (attempts are 0-indexed)
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt as i32);
        let delay = self.base_delay.mul_f64(factor.max(0.0));
        delay.min(self.max_delay)
    }
}

/// Run `op` until it succeeds, a non-retryable error occurs, or attempts
/// are exhausted. The last error is returned unchanged.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &BackoffPolicy,
    what: &str,
    mut op: F,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.max_attempts.max(1);

    for attempt in 0..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let last = attempt + 1 == attempts;
                if last || !e.is_retryable() {
                    error!("{} failed after {} attempt(s): {}", what, attempt + 1, e);
                    return Err(e);
                }

                let mut delay = policy.delay_for(attempt);
                if e.is_rate_limited() {
                    delay = e
                        .retry_after()
                        .unwrap_or(delay * RATE_LIMIT_FACTOR)
                        .min(policy.max_delay);
                }

                warn!(
                    "{} attempt {} failed: {}. Retrying in {:.1}s",
                    what,
                    attempt + 1,
                    e,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    unreachable!("retry loop always returns")
}
