//! Clock abstraction so schedulers and sweeps can be driven deterministically
//! in tests.

use std::sync::atomic::{AtomicI64, Ordering};

/// Unix timestamp in seconds, the unit used on-chain.
pub type UnixTimestamp = i64;

pub trait TimeSource: Send + Sync {
    /// Current time in seconds since the epoch.
    fn now(&self) -> UnixTimestamp;

    /// Current time in milliseconds since the epoch.
    fn now_millis(&self) -> i64 {
        self.now().saturating_mul(1000)
    }
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> UnixTimestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as UnixTimestamp
    }

    fn now_millis(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }
}

/// Manually driven clock for tests across crates.
#[derive(Debug, Default)]
pub struct MockTimeSource {
    time: AtomicI64,
}

impl MockTimeSource {
    pub fn new(initial: UnixTimestamp) -> Self {
        Self {
            time: AtomicI64::new(initial),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.time.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, time: UnixTimestamp) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> UnixTimestamp {
        self.time.load(Ordering::SeqCst)
    }
}
