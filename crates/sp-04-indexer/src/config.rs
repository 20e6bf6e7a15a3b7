//! # Indexer Configuration
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SP_BACKFILL_PAGE_SIZE` | `1000` | signatures per `getSignaturesForAddress` page |
//! | `SP_FULL_SYNC_INTERVAL_SECS` | `3600` | period of the full account sync |
//! | `SP_RESUBSCRIBE_DELAY_SECS` | `5` | pause before re-subscribing after the log stream ends |

use shared_types::Address;
use std::env;
use std::time::Duration;

/// Largest page the RPC node serves.
pub const MAX_SIGNATURE_PAGE: usize = 1000;

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub program_id: Address,
    pub backfill_page_size: usize,
    pub full_sync_interval: Duration,
    pub resubscribe_delay: Duration,
}

impl IndexerConfig {
    pub fn new(program_id: Address) -> Self {
        Self {
            program_id,
            backfill_page_size: MAX_SIGNATURE_PAGE,
            full_sync_interval: Duration::from_secs(3600),
            resubscribe_delay: Duration::from_secs(5),
        }
    }

    pub fn from_env(program_id: Address) -> Self {
        let defaults = Self::new(program_id);
        let page_size = env::var("SP_BACKFILL_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.backfill_page_size);
        let sync_secs = env::var("SP_FULL_SYNC_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.full_sync_interval.as_secs());
        let resubscribe_secs = env::var("SP_RESUBSCRIBE_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.resubscribe_delay.as_secs());

        Self {
            program_id,
            backfill_page_size: page_size.clamp(1, MAX_SIGNATURE_PAGE),
            full_sync_interval: Duration::from_secs(sync_secs.max(1)),
            resubscribe_delay: Duration::from_secs(resubscribe_secs),
        }
    }

    /// Small pages and short delays.
    pub fn for_testing(program_id: Address) -> Self {
        Self {
            program_id,
            backfill_page_size: 2,
            full_sync_interval: Duration::from_secs(60),
            resubscribe_delay: Duration::from_millis(10),
        }
    }
}
