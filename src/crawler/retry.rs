//! Bounded retry with exponential backoff
//!
//! Navigations that fail for transient reasons (timeouts, connection
//! resets, HTTP 429/5xx) are retried a bounded number of times, waiting
//! `base * 2^(attempt-1)` plus a random jitter between attempts. Failures
//! that retrying cannot fix short-circuit immediately.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Outcome of a single attempt, as judged by the caller
#[derive(Debug)]
pub enum Attempt<T, E> {
    /// The attempt succeeded
    Ok(T),
    /// The attempt failed for a reason another try might fix
    Retry(E),
    /// The attempt failed for a reason retrying cannot fix
    Fatal(E),
}

/// Why a retried operation ultimately gave up
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error,
{
    /// Every allowed attempt failed with a retryable error
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    /// An attempt failed in a way retrying cannot fix
    #[error("{0}")]
    Fatal(E),
}

/// Retry schedule parameters
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts before giving up (first try included)
    pub max_attempts: u32,
    /// Backoff base: the wait after the first failed attempt
    pub base_delay: Duration,
    /// Upper bound of the random jitter added to every wait
    pub jitter_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.backoff_base_ms),
            jitter_max: Duration::from_millis(config.backoff_jitter_ms),
        }
    }

    /// Wait after the given failed attempt (1-based): base doubles each
    /// time, jitter is drawn fresh.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // Cap the exponent so a misconfigured max_attempts cannot overflow.
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1u32 << exponent);

        let jitter_ms = self.jitter_max.as_millis() as u64;
        if jitter_ms == 0 {
            return backoff;
        }
        backoff + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// Runs `operation` until it succeeds, fails fatally, or exhausts the
/// policy. The closure receives the attempt number (1-based) and judges
/// its own outcome via [`Attempt`].
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: std::error::Error,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T, E>>,
{
    let mut attempt = 1u32;
    loop {
        match operation(attempt).await {
            Attempt::Ok(value) => return Ok(value),
            Attempt::Fatal(error) => return Err(RetryError::Fatal(error)),
            Attempt::Retry(error) => {
                if attempt >= policy.max_attempts {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: error,
                    });
                }
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "Attempt {}/{} failed: {} (retrying in {:?})",
                    attempt,
                    policy.max_attempts,
                    error,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
