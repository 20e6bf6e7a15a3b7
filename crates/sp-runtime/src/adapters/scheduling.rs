//! Lets the indexer queue first payments on the scheduler.

use std::sync::Arc;

use async_trait::async_trait;
use sp_01_chain_gateway::ChainGateway;
use sp_03_ledger_store::{LedgerRepository, Subscription};
use sp_04_indexer::{IndexerError, IndexerResult, PaymentScheduling};
use sp_05_payment_scheduler::PaymentScheduler;

pub struct SchedulerBridge<G: ChainGateway, S: LedgerRepository> {
    scheduler: Arc<PaymentScheduler<G, S>>,
}

impl<G: ChainGateway, S: LedgerRepository> SchedulerBridge<G, S> {
    pub fn new(scheduler: Arc<PaymentScheduler<G, S>>) -> Self {
        Self { scheduler }
    }
}

#[async_trait]
impl<G, S> PaymentScheduling for SchedulerBridge<G, S>
where
    G: ChainGateway + 'static,
    S: LedgerRepository + 'static,
{
    async fn ensure_scheduled(&self, subscription: &Subscription) -> IndexerResult<bool> {
        self.scheduler
            .schedule_next_payment(subscription)
            .map(|scheduled| scheduled.is_some())
            .map_err(|e| IndexerError::Scheduling(e.to_string()))
    }
}

/// Used when the scheduler is disabled. Subscriptions stay unscheduled
/// until a process with the scheduler enabled runs a full sync.
pub struct NoScheduling;

#[async_trait]
impl PaymentScheduling for NoScheduling {
    async fn ensure_scheduled(&self, _subscription: &Subscription) -> IndexerResult<bool> {
        Ok(false)
    }
}
