//! # Indexing Scenarios
//!
//! Restart recovery from the persisted checkpoint, replay idempotence and
//! full-sync reconciliation against the accounts on chain.

#[cfg(test)]
mod tests {
    use sp_03_ledger_store::{
        CheckpointRepository, PaymentStatus, PlanRepository, ScheduledPaymentRepository,
        SubscriptionRepository, TransactionKind, TransactionLog, WalletRepository,
    };

    use crate::harness::{Deployment, Fixture, FEE, GENESIS_SLOT, MONTH, T0};

    #[tokio::test]
    async fn test_first_boot_starts_at_tip() {
        let d = Deployment::new();
        d.chain.advance_slots(25);

        let report = d.boot().await;
        assert_eq!(report.tip, GENESIS_SLOT + 25);
        assert_eq!(report.resumed_from, None);
        assert_eq!(report.backfill.transactions, 0);
        assert_eq!(d.store.last_processed_slot().unwrap(), Some(GENESIS_SLOT + 25));
    }

    #[tokio::test]
    async fn test_restart_backfills_activity_missed_while_down() {
        let d = Deployment::new();
        d.boot().await;

        // The process is down while a merchant onboards a subscriber.
        let merchant = d.chain.fresh_address(0x40);
        let user = d.chain.fresh_address(0x50);
        d.register_merchant(merchant);
        let plan = d.chain.register_plan(merchant, "pro", FEE, MONTH);
        d.chain.advance_slots(40);
        let wallet = d.chain.create_wallet(user, 5 * FEE);
        d.chain.advance_slots(57);
        let subscription = d.chain.subscribe(user, wallet, plan);

        let d = d.restart().await;
        let report = d.boot().await;
        assert_eq!(report.resumed_from, Some(GENESIS_SLOT));
        assert_eq!(report.backfill.signatures, 3);
        assert_eq!(report.backfill.transactions, 3);
        assert_eq!(report.backfill.events.applied, 3);
        assert_eq!(report.backfill.checkpoint, Some(d.chain.slot()));

        let kinds: Vec<TransactionKind> = d
            .store
            .all_transactions()
            .unwrap()
            .iter()
            .map(|record| record.kind)
            .collect();
        assert_eq!(kinds.len(), 3);
        assert!(kinds.contains(&TransactionKind::PlanRegistered));
        assert!(kinds.contains(&TransactionKind::WalletCreated));
        assert!(kinds.contains(&TransactionKind::SubscriptionCreated));

        assert!(d.store.get_plan(&plan).unwrap().is_some());
        let stored_wallet = d.store.get_wallet(&wallet).unwrap().unwrap();
        assert!(stored_wallet.main_token_account.is_some());
        let sub = d.store.get_subscription(&subscription).unwrap().unwrap();
        assert!(sub.is_active);
        assert_eq!(sub.last_payment_timestamp, T0);

        let row = d.store.open_payment_for(&subscription).unwrap().unwrap();
        assert_eq!(row.scheduled_for, T0 + MONTH);
        assert_eq!(d.outbox.events("subscription.created").len(), 1);

        // Restarting again replays only the checkpoint slot.
        let d = d.restart().await;
        let report = d.boot().await;
        assert_eq!(report.backfill.transactions, 1);
        assert_eq!(report.backfill.events.applied, 0);
        assert_eq!(report.backfill.events.duplicates, 1);
        assert_eq!(d.store.all_transactions().unwrap().len(), 3);
        assert_eq!(d.store.scheduled_for_subscription(&subscription).unwrap().len(), 1);
        assert_eq!(d.outbox.events("subscription.created").len(), 1);
    }

    #[tokio::test]
    async fn test_replaying_history_changes_nothing() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;
        d.clock.set(T0 + MONTH);
        d.sweep().await;
        d.catch_up().await;

        let before = d.store.get_subscription(&f.subscription).unwrap().unwrap();
        let records = d.store.all_transactions().unwrap().len();
        let webhooks = d.outbox.requests().len();

        for _ in 0..3 {
            let report = d.catch_up().await;
            assert_eq!(report.events.applied, 0);
        }

        let after = d.store.get_subscription(&f.subscription).unwrap().unwrap();
        assert_eq!(after.payment_count, before.payment_count);
        assert_eq!(after.total_paid, before.total_paid);
        assert_eq!(d.store.all_transactions().unwrap().len(), records);
        assert_eq!(d.outbox.requests().len(), webhooks);
    }

    #[tokio::test]
    async fn test_full_sync_closes_subscription_missing_on_chain() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;
        assert!(d.store.open_payment_for(&f.subscription).unwrap().is_some());

        d.chain.close_account(&f.subscription);
        let report = d.full_sync().await;
        assert_eq!(report.closed, 1);
        assert_eq!(report.subscriptions, 0);

        let sub = d.store.get_subscription(&f.subscription).unwrap().unwrap();
        assert!(!sub.is_active);
        assert!(sub.cancelled_at.is_some());

        let rows = d.store.scheduled_for_subscription(&f.subscription).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, PaymentStatus::Cancelled);

        // A second run has nothing left to close.
        assert_eq!(d.full_sync().await.closed, 0);

        d.clock.set(T0 + MONTH);
        assert_eq!(d.sweep().await.due, 0);
        assert_eq!(d.chain.payments_landed(), 0);
    }

    #[tokio::test]
    async fn test_full_sync_schedules_subscription_without_open_payment() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        assert_eq!(d.store.cancel_pending_for(&f.subscription).unwrap(), 1);
        assert!(d.store.open_payment_for(&f.subscription).unwrap().is_none());

        let report = d.full_sync().await;
        assert_eq!(report.scheduled, 1);
        let row = d.store.open_payment_for(&f.subscription).unwrap().unwrap();
        assert_eq!(row.scheduled_for, T0 + MONTH);

        // Already scheduled, nothing more to do.
        assert_eq!(d.full_sync().await.scheduled, 0);
    }

    #[tokio::test]
    async fn test_full_sync_takes_counters_from_accounts() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        // A second subscriber whose events were never indexed.
        let other = d.chain.fresh_address(0x51);
        let other_wallet = d.chain.create_wallet(other, FEE);
        let other_sub = d.chain.subscribe(other, other_wallet, f.plan);

        let report = d.full_sync().await;
        assert_eq!(report.plans, 1);
        assert_eq!(report.wallets, 2);
        assert_eq!(report.subscriptions, 2);
        assert_eq!(report.scheduled, 1);

        let plan = d.store.get_plan(&f.plan).unwrap().unwrap();
        assert_eq!(plan.total_subscribers, 2);
        let sub = d.store.get_subscription(&other_sub).unwrap().unwrap();
        assert!(sub.is_active);
        assert!(d.store.open_payment_for(&other_sub).unwrap().is_some());
    }
}
