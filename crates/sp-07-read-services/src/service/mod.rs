//! # Read Service
//!
//! One service struct implements all three inbound APIs over a shared
//! store handle. Time windows and due-date arithmetic use the injected
//! clock.

mod analytics;
mod merchants;
mod subscriptions;

use rand::RngCore;
use shared_types::{TimeSource, UnixTimestamp};
use sp_03_ledger_store::LedgerRepository;
use std::sync::Arc;

/// Webhook secrets are 32 random bytes, hex encoded.
pub const WEBHOOK_SECRET_BYTES: usize = 32;

/// Transaction records included in a subscription detail.
pub const DETAIL_TRANSACTION_LIMIT: usize = 50;

pub struct ReadService<S: LedgerRepository> {
    store: Arc<S>,
    time: Arc<dyn TimeSource>,
}

impl<S: LedgerRepository> ReadService<S> {
    pub fn new(store: Arc<S>, time: Arc<dyn TimeSource>) -> Self {
        Self { store, time }
    }

    fn now(&self) -> UnixTimestamp {
        self.time.now()
    }
}

fn generate_webhook_secret() -> String {
    let mut bytes = [0u8; WEBHOOK_SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
