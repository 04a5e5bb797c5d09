use crate::error::CrawlError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Bounded exponential-backoff retry for remote calls.
///
/// Attempt `n` (zero based) that fails with a transient error waits
/// `backoff_unit * backoff_base^n` before the next attempt. Non-transient
/// errors are returned immediately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Base of the exponential backoff
    pub backoff_base: f64,

    /// Length of one backoff unit
    #[serde(skip, default = "default_backoff_unit")]
    pub backoff_unit: Duration,
}

/// Longest wait between two attempts
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Largest backoff base a configuration may ask for
pub const MAX_BACKOFF_BASE: f64 = 10.0;

fn default_backoff_unit() -> Duration {
    Duration::from_secs(1)
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: f64) -> Self {
        Self {
            max_attempts,
            backoff_base,
            backoff_unit: default_backoff_unit(),
        }
    }

    /// Policy for browser connections and page loads: 3 attempts, base 2
    pub fn browser() -> Self {
        Self::new(3, 2.0)
    }

    /// Policy for language model calls: 2 attempts, base 1
    pub fn oracle() -> Self {
        Self::new(2, 1.0)
    }

    /// Replace the backoff unit (tests use `Duration::ZERO`)
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Delay before the attempt following failed attempt `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_base.powi(attempt as i32);
        if self.backoff_unit.is_zero() || factor.is_nan() || factor <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.backoff_unit.as_secs_f64() * factor)
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }

    /// Run `operation`, retrying transient failures
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, CrawlError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CrawlError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    if attempt + 1 >= max_attempts {
                        ::log::error!("{} failed after {} attempts: {}", label, max_attempts, e);
                        return Err(e);
                    }

                    let wait = self.delay_for(attempt);
                    ::log::warn!(
                        "{} attempt {}/{} failed: {}. Retrying in {:.1}s...",
                        label,
                        attempt + 1,
                        max_attempts,
                        e,
                        wait.as_secs_f64()
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::browser()
    }
}
