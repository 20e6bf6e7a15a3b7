//! # Outbound Ports
//!
//! Side effects the indexer triggers outside the store. Chain access is
//! the [`ChainGateway`](sp_01_chain_gateway::ChainGateway) port and
//! persistence is the ledger store's repository traits.

use async_trait::async_trait;
use sp_03_ledger_store::Subscription;

use crate::domain::errors::IndexerResult;

/// Best-effort merchant notifications for lifecycle events. Called only
/// for freshly applied events, never for duplicates.
#[async_trait]
pub trait LifecycleNotifier: Send + Sync {
    async fn subscription_created(&self, subscription: &Subscription);

    async fn subscription_cancelled(&self, subscription: &Subscription, payments_made: u32);
}

/// Hands subscriptions to the payment scheduler.
#[async_trait]
pub trait PaymentScheduling: Send + Sync {
    /// Make sure `subscription` has an open scheduled payment. Returns
    /// `true` when a new row was created.
    async fn ensure_scheduled(&self, subscription: &Subscription) -> IndexerResult<bool>;
}
