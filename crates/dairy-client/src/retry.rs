//! # Rate-Limit Retry
//!
//! Retries an operation while the server answers HTTP 429.
//!
//! ## Retry Loop
//! ```text
//!              ┌──────────────┐
//!      ┌──────►│  run op()    │
//!      │       └──────┬───────┘
//!      │              │
//!      │     ┌────────┼──────────────────┐
//!      │     ▼        ▼                  ▼
//!      │   Ok(v)   RateLimited       other error
//!      │   return     │               return now
//!      │              ▼
//!      │     retries left? ── no ──► RateLimitExceeded { attempts }
//!      │              │ yes
//!      │              ▼
//!      └──── sleep(next_backoff)   1s, 2s, 4s, 8s, 16s
//! ```
//!
//! Only list reads go through here. Auth and checkout calls are sent once.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use tracing::{debug, warn};

use crate::config::RetrySettings;
use crate::error::{ClientError, ClientResult};

/// How often and how long to wait when rate limited.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy {
            max_retries: settings.max_retries,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            multiplier: settings.multiplier,
            max_delay: Duration::from_secs(settings.max_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// A policy with a fixed retry count and a tiny initial delay.
    pub fn immediate(max_retries: u32) -> Self {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            multiplier: 1.0,
            max_delay: Duration::from_millis(1),
        }
    }

    /// Deterministic exponential schedule (no jitter, no elapsed-time cap;
    /// the retry count is the only limit).
    fn schedule(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_multiplier(self.multiplier)
            .with_randomization_factor(0.0)
            .with_max_interval(self.max_delay)
            .with_max_elapsed_time(None)
            .build()
    }

    /// The waits this policy would perform, in order.
    pub fn delays(&self) -> Vec<Duration> {
        let mut schedule = self.schedule();
        (0..self.max_retries)
            .filter_map(|_| schedule.next_backoff())
            .collect()
    }
}

/// Runs `op` until it succeeds, fails with something other than
/// [`ClientError::RateLimited`], or the retries run out.
pub async fn retry_rate_limited<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let mut schedule = policy.schedule();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match op().await {
            Err(e) if e.is_retryable() => {
                if attempt > policy.max_retries {
                    warn!(attempts = attempt, "Still rate limited, giving up");
                    return Err(ClientError::RateLimitExceeded { attempts: attempt });
                }
                let Some(delay) = schedule.next_backoff() else {
                    return Err(ClientError::RateLimitExceeded { attempts: attempt });
                };
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Rate limited, backing off");
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
