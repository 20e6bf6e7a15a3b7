//! Backoff for failed payment attempts.

use shared_types::UnixTimestamp;
use std::time::Duration;

/// Backoff bounded by `max_delay`, with at most `max_retries` attempts in
/// total. A multiplier of 1 gives a fixed delay; above 1 the delay grows
/// exponentially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
}

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(300);
/// Cap applied when exponential backoff is switched on without an explicit
/// maximum.
pub const DEFAULT_BACKOFF_CAP: Duration = Duration::from_secs(3600);

/// Three attempts, five minutes apart.
impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay: delay,
            multiplier: 1,
            max_delay: delay,
        }
    }

    /// Delay before the attempt following failure number `failures`
    /// (1-based).
    pub fn delay_after(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1);
        let factor = self.multiplier.max(1).saturating_pow(exponent);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// When to try again after `failures` failed attempts, or `None` once
    /// the attempts are exhausted.
    pub fn next_retry_at(&self, failures: u32, now: UnixTimestamp) -> Option<UnixTimestamp> {
        if failures >= self.max_retries {
            return None;
        }
        let delay = i64::try_from(self.delay_after(failures).as_secs()).unwrap_or(i64::MAX);
        Some(now.saturating_add(delay))
    }
}
