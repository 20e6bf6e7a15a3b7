//! # Outbound Ports
//!
//! The scheduler reaches the chain through
//! [`ChainGateway`](sp_01_chain_gateway::ChainGateway) and the store through
//! the ledger repositories. Merchant notifications go through
//! [`PaymentNotifier`].

use async_trait::async_trait;
use sp_03_ledger_store::Subscription;

use crate::domain::outcome::{PaymentFailed, PaymentSucceeded};

/// Best-effort payment notifications. Implementations log and swallow
/// their own failures.
#[async_trait]
pub trait PaymentNotifier: Send + Sync {
    async fn payment_succeeded(&self, subscription: &Subscription, payment: &PaymentSucceeded);

    async fn payment_failed(&self, subscription: &Subscription, failure: &PaymentFailed);
}
