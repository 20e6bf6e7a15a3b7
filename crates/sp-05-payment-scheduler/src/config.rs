//! # Scheduler Configuration
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SP_SWEEP_INTERVAL_SECS` | `60` | period of the due-payment sweep |
//! | `SP_SWEEP_BATCH_SIZE` | `50` | rows executed per sweep |
//! | `SP_PAYMENT_DELAY_MS` | `500` | pause between payments within a sweep |
//! | `SP_MAX_RETRIES` | `3` | attempts per row before it fails terminally |
//! | `SP_RETRY_BASE_DELAY_SECS` | `300` | delay between attempts |
//! | `SP_RETRY_MULTIPLIER` | `1` | fixed delay; above `1` enables exponential backoff |
//! | `SP_RETRY_MAX_DELAY_SECS` | `3600` | backoff cap, only used when the multiplier is above `1` |
//! | `SP_PROCESSING_TIMEOUT_SECS` | `900` | age at which a `processing` row is reaped |
//! | `SP_COMPLETED_RETENTION_DAYS` | `30` | completed rows older than this are purged |
//! | `SP_MAINTENANCE_INTERVAL_SECS` | `300` | period of reaping and purging |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::retry::{RetryPolicy, DEFAULT_BACKOFF_CAP};

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub sweep_interval: Duration,
    pub batch_size: usize,
    pub payment_delay: Duration,
    pub retry: RetryPolicy,
    pub processing_timeout: Duration,
    pub completed_retention: Duration,
    pub maintenance_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            batch_size: 50,
            payment_delay: Duration::from_millis(500),
            retry: RetryPolicy::default(),
            processing_timeout: Duration::from_secs(15 * 60),
            completed_retention: Duration::from_secs(30 * SECONDS_PER_DAY),
            maintenance_interval: Duration::from_secs(300),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_delay = Duration::from_secs(env_or(
            "SP_RETRY_BASE_DELAY_SECS",
            defaults.retry.base_delay.as_secs(),
        ));
        let multiplier = env_or("SP_RETRY_MULTIPLIER", defaults.retry.multiplier).max(1);
        let max_delay = if multiplier > 1 {
            Duration::from_secs(env_or(
                "SP_RETRY_MAX_DELAY_SECS",
                DEFAULT_BACKOFF_CAP.as_secs(),
            ))
            .max(base_delay)
        } else {
            base_delay
        };
        let retry = RetryPolicy {
            max_retries: env_or("SP_MAX_RETRIES", defaults.retry.max_retries).max(1),
            base_delay,
            multiplier,
            max_delay,
        };

        Self {
            sweep_interval: Duration::from_secs(
                env_or("SP_SWEEP_INTERVAL_SECS", defaults.sweep_interval.as_secs()).max(1),
            ),
            batch_size: env_or("SP_SWEEP_BATCH_SIZE", defaults.batch_size).max(1),
            payment_delay: Duration::from_millis(env_or(
                "SP_PAYMENT_DELAY_MS",
                defaults.payment_delay.as_millis() as u64,
            )),
            retry,
            processing_timeout: Duration::from_secs(env_or(
                "SP_PROCESSING_TIMEOUT_SECS",
                defaults.processing_timeout.as_secs(),
            )),
            completed_retention: Duration::from_secs(
                env_or("SP_COMPLETED_RETENTION_DAYS", 30u64) * SECONDS_PER_DAY,
            ),
            maintenance_interval: Duration::from_secs(
                env_or(
                    "SP_MAINTENANCE_INTERVAL_SECS",
                    defaults.maintenance_interval.as_secs(),
                )
                .max(1),
            ),
        }
    }

    /// No inter-payment delay, fixed five-minute retries.
    pub fn for_testing() -> Self {
        Self {
            payment_delay: Duration::ZERO,
            retry: RetryPolicy::fixed(3, Duration::from_secs(300)),
            ..Self::default()
        }
    }
}
