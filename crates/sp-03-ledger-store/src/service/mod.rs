//! # Ledger Store Service
//!
//! [`LedgerStore`] implements every repository trait over a single
//! [`KeyValueStore`]. Each mutation takes the write lock, reads what it
//! needs, builds one batch and commits it with `atomic_batch_write`, so
//! check-then-write sequences (duplicate detection, the one-open-payment
//! rule, counter updates) cannot interleave.
//!
//! Queries are prefix scans filtered in memory.

mod helpers;
mod projection;
mod schedule;
#[cfg(test)]
mod tests;

use parking_lot::RwLock;
use shared_types::{SystemTimeSource, TimeSource, UnixTimestamp};
use std::sync::Arc;

use crate::ports::outbound::{InMemoryKVStore, KeyValueStore};

pub struct LedgerStore<K: KeyValueStore> {
    pub(crate) kv: RwLock<K>,
    pub(crate) time: Arc<dyn TimeSource>,
}

impl<K: KeyValueStore> LedgerStore<K> {
    pub fn new(kv: K, time: Arc<dyn TimeSource>) -> Self {
        Self {
            kv: RwLock::new(kv),
            time,
        }
    }

    pub(crate) fn now(&self) -> UnixTimestamp {
        self.time.now()
    }
}

impl LedgerStore<InMemoryKVStore> {
    /// Ephemeral store on the wall clock.
    pub fn in_memory() -> Self {
        Self::new(InMemoryKVStore::new(), Arc::new(SystemTimeSource))
    }

    pub fn in_memory_with_clock(time: Arc<dyn TimeSource>) -> Self {
        Self::new(InMemoryKVStore::new(), time)
    }
}
