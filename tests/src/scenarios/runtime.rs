//! # Runtime Scenarios
//!
//! The assembled process with its background tasks running: live indexing
//! through the log subscription, index-only mode and graceful shutdown.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use shared_types::{MockTimeSource, TimeSource};
    use sp_03_ledger_store::{
        LedgerStore, ScheduledPaymentRepository, SubscriptionRepository, TransactionLog,
    };
    use sp_runtime::Runtime;

    use crate::harness::{
        runtime_config, Deployment, SimulatedChain, WebhookOutbox, FEE, MONTH, T0,
    };

    async fn eventually<F: Fn() -> bool>(what: &str, condition: F) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {}",
                what
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_live_listener_indexes_new_activity() {
        let mut d = Deployment::new();
        d.runtime.start().await.unwrap();
        eventually("live subscription", || d.chain.has_live_subscriber()).await;
        assert!(d.runtime.finished_tasks().is_empty());

        let merchant = d.chain.fresh_address(0x40);
        let user = d.chain.fresh_address(0x50);
        d.register_merchant(merchant);
        let plan = d.chain.register_plan(merchant, "pro", FEE, MONTH);
        let wallet = d.chain.create_wallet(user, 5 * FEE);
        let subscription = d.chain.subscribe(user, wallet, plan);

        let store = d.store.clone();
        eventually("scheduled first payment", || {
            matches!(store.open_payment_for(&subscription), Ok(Some(_)))
        })
        .await;

        let sub = d.store.get_subscription(&subscription).unwrap().unwrap();
        assert!(sub.is_active);
        assert_eq!(sub.next_payment_at(), T0 + MONTH);
        assert_eq!(d.store.all_transactions().unwrap().len(), 3);
        eventually("created webhook", || {
            d.outbox.events("subscription.created").len() == 1
        })
        .await;

        assert!(d.runtime.finished_tasks().is_empty());
        let chain = d.chain.clone();
        d.runtime.shutdown().await;
        assert!(!chain.has_live_subscriber());
    }

    #[tokio::test]
    async fn test_index_only_mode_never_schedules() {
        let clock = Arc::new(MockTimeSource::new(T0));
        let time: Arc<dyn TimeSource> = clock.clone();
        let chain = Arc::new(SimulatedChain::new(clock.clone()));
        let store = Arc::new(LedgerStore::in_memory_with_clock(clock.clone()));
        let outbox = Arc::new(WebhookOutbox::default());

        let mut config = runtime_config();
        config.scheduler_enabled = false;
        config.gateway.payer_secret_key = None;
        config.validate().unwrap();

        let mut runtime = Runtime::new(&config, chain.clone(), store.clone(), outbox, time);
        assert!(runtime.scheduler().is_none());
        runtime.start().await.unwrap();
        eventually("live subscription", || chain.has_live_subscriber()).await;

        let merchant = chain.fresh_address(0x40);
        let user = chain.fresh_address(0x50);
        let plan = chain.register_plan(merchant, "pro", FEE, MONTH);
        let wallet = chain.create_wallet(user, 5 * FEE);
        let subscription = chain.subscribe(user, wallet, plan);

        eventually("indexed subscription", || {
            matches!(store.get_subscription(&subscription), Ok(Some(_)))
        })
        .await;
        assert!(store.open_payment_for(&subscription).unwrap().is_none());

        clock.set(T0 + MONTH);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(chain.payments_landed(), 0);

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_before_start_is_immediate() {
        let d = Deployment::new();
        let started = tokio::time::Instant::now();
        d.runtime.shutdown().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
