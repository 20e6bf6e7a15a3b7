//! # Recurring Payment Scenarios
//!
//! The scheduler queues each cycle at `last_payment_timestamp + interval`,
//! executes it against the chain, applies it to the projection and queues
//! the next one. Balance shortfalls are retried to the bound, then fail
//! terminally with exactly one payment-failed webhook.

#[cfg(test)]
mod tests {
    use shared_types::TokenAmount;
    use sp_03_ledger_store::{
        PaymentStatus, PlanRepository, ScheduledPaymentRepository, SubscriptionRepository,
        WalletRepository,
    };

    use crate::harness::{Deployment, Fixture, FEE, MAX_RETRIES, MONTH, RETRY_DELAY, T0};

    #[tokio::test]
    async fn test_first_payment_is_queued_one_interval_after_subscribing() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        let row = d.store.open_payment_for(&f.subscription).unwrap().unwrap();
        assert_eq!(row.status, PaymentStatus::Pending);
        assert_eq!(row.scheduled_for, T0 + MONTH);
        assert_eq!(row.amount, TokenAmount::from_u64(FEE));
        assert_eq!(row.merchant, f.merchant);

        // Nothing is due yet.
        let report = d.sweep().await;
        assert_eq!(report.due, 0);
        assert_eq!(d.chain.payments_landed(), 0);
    }

    #[tokio::test]
    async fn test_happy_path_executes_and_queues_next_cycle() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        d.clock.set(T0 + MONTH);
        let report = d.sweep().await;
        assert_eq!(report.completed, 1);
        assert_eq!(d.chain.payments_landed(), 1);

        let sub = d.store.get_subscription(&f.subscription).unwrap().unwrap();
        assert_eq!(sub.payment_count, 1);
        assert_eq!(sub.total_paid.to_string(), "1000000");
        assert_eq!(sub.last_payment_timestamp, T0 + MONTH);

        let next = d.store.open_payment_for(&f.subscription).unwrap().unwrap();
        assert_eq!(next.scheduled_for, T0 + 2 * MONTH);
        assert_eq!(next.status, PaymentStatus::Pending);

        let completed = d.store.payments_with_status(PaymentStatus::Completed).unwrap();
        assert_eq!(completed.len(), 1);
        assert!(completed[0].signature.is_some());
        assert_eq!(completed[0].executed_at, Some(T0 + MONTH));

        let succeeded = d.outbox.events("subscription.payment_succeeded");
        assert_eq!(succeeded.len(), 1);
        assert_eq!(succeeded[0]["data"]["payment_number"], 1);
        assert_eq!(succeeded[0]["data"]["amount"], "1000000");
        assert_eq!(
            succeeded[0]["data"]["signature"],
            completed[0].signature.clone().unwrap().as_str()
        );
    }

    #[tokio::test]
    async fn test_indexed_payment_event_is_not_applied_twice() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        d.clock.set(T0 + MONTH);
        d.sweep().await;

        // The PaymentExecuted event of the same transaction arrives through
        // the indexer after the scheduler already applied it. The checkpoint
        // slot (the subscribe transaction) is replayed as well.
        let report = d.catch_up().await;
        assert_eq!(report.transactions, 2);
        assert_eq!(report.events.applied, 0);
        assert_eq!(report.events.duplicates, 2);

        d.full_sync().await;

        let sub = d.store.get_subscription(&f.subscription).unwrap().unwrap();
        assert_eq!(sub.payment_count, 1);
        assert_eq!(sub.total_paid, TokenAmount::from_u64(FEE));
        let plan = d.store.get_plan(&f.plan).unwrap().unwrap();
        assert_eq!(plan.total_revenue, TokenAmount::from_u64(FEE));
    }

    #[tokio::test]
    async fn test_totals_after_several_cycles() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        for cycle in 1..=4 {
            d.clock.set(T0 + cycle * MONTH);
            assert_eq!(d.sweep().await.completed, 1, "cycle {}", cycle);
            d.catch_up().await;
        }

        let sub = d.store.get_subscription(&f.subscription).unwrap().unwrap();
        assert_eq!(sub.payment_count, 4);
        assert_eq!(sub.total_paid, TokenAmount::from_u64(4 * FEE));

        let plan = d.store.get_plan(&f.plan).unwrap().unwrap();
        assert_eq!(plan.total_revenue, TokenAmount::from_u64(4 * FEE));

        let wallet = d.store.get_wallet(&f.wallet).unwrap().unwrap();
        assert_eq!(wallet.total_spent, TokenAmount::from_u64(4 * FEE));
        assert_eq!(d.chain.token_balance(&f.wallet), 6 * FEE);

        // On-chain counters agree with the projection.
        let account = d.chain.subscription(&f.subscription);
        assert_eq!(account.payment_count, 4);
        assert_eq!(account.total_paid, 4 * FEE);

        let numbers: Vec<_> = d
            .outbox
            .events("subscription.payment_succeeded")
            .iter()
            .map(|body| body["data"]["payment_number"].as_u64().unwrap())
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_insufficient_balance_retries_then_fails_once() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 3 * FEE).await;

        for cycle in 1..=3 {
            d.clock.set(T0 + cycle * MONTH);
            assert_eq!(d.sweep().await.completed, 1);
        }
        assert_eq!(d.chain.token_balance(&f.wallet), 0);

        d.clock.set(T0 + 4 * MONTH);
        for attempt in 1..MAX_RETRIES {
            let report = d.sweep().await;
            assert_eq!(report.retrying, 1, "attempt {}", attempt);
            let row = d.store.open_payment_for(&f.subscription).unwrap().unwrap();
            assert_eq!(row.retry_count, attempt);
            assert_eq!(row.status, PaymentStatus::Pending);
            assert!(row
                .error_message
                .as_deref()
                .unwrap()
                .contains("Insufficient balance"));
            d.clock.advance(RETRY_DELAY);
        }

        let report = d.sweep().await;
        assert_eq!(report.failed, 1);
        assert!(d.store.open_payment_for(&f.subscription).unwrap().is_none());

        let failed = d.store.payments_with_status(PaymentStatus::Failed).unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].retry_count, MAX_RETRIES);

        let notices = d.outbox.events("subscription.payment_failed");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0]["data"]["failure_count"], MAX_RETRIES);
        assert_eq!(notices[0]["data"]["amount_required"], "1000000");
        assert_eq!(notices[0]["data"]["balance_available"], "0");

        // The failed row is never picked up again.
        d.clock.advance(10 * RETRY_DELAY);
        assert_eq!(d.sweep().await.due, 0);
        assert_eq!(d.outbox.events("subscription.payment_failed").len(), 1);
        assert_eq!(d.chain.payments_landed(), 3);
    }

    #[tokio::test]
    async fn test_refunded_wallet_recovers_on_retry() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 0).await;

        d.clock.set(T0 + MONTH);
        assert_eq!(d.sweep().await.retrying, 1);

        d.chain.fund(&f.wallet, FEE);
        d.clock.advance(RETRY_DELAY);
        assert_eq!(d.sweep().await.completed, 1);

        let sub = d.store.get_subscription(&f.subscription).unwrap().unwrap();
        assert_eq!(sub.payment_count, 1);
        assert!(d.outbox.events("subscription.payment_failed").is_empty());
    }

    #[tokio::test]
    async fn test_rpc_outage_is_retried() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 5 * FEE).await;

        d.chain.set_rpc_outage(true);
        d.clock.set(T0 + MONTH);
        assert_eq!(d.sweep().await.retrying, 1);
        let row = d.store.open_payment_for(&f.subscription).unwrap().unwrap();
        assert_eq!(row.scheduled_for, T0 + MONTH + RETRY_DELAY);

        d.chain.set_rpc_outage(false);
        d.clock.advance(RETRY_DELAY);
        assert_eq!(d.sweep().await.completed, 1);
        assert_eq!(d.chain.payments_landed(), 1);
    }
}
