//! # Cancellation Scenarios
//!
//! A cancelled subscription never pays again: its pending row is
//! cancelled with the projection, and a payment that races an unindexed
//! cancellation is rejected by the on-chain check.

#[cfg(test)]
mod tests {
    use sp_03_ledger_store::{PaymentStatus, ScheduledPaymentRepository, SubscriptionRepository};

    use crate::harness::{Deployment, Fixture, FEE, MONTH, T0};

    #[tokio::test]
    async fn test_cancel_before_first_payment() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        d.clock.advance(3_600);
        d.chain.cancel(f.subscription);
        d.catch_up().await;

        let sub = d.store.get_subscription(&f.subscription).unwrap().unwrap();
        assert!(!sub.is_active);
        assert_eq!(sub.cancelled_at, Some(T0 + 3_600));

        let rows = d.store.scheduled_for_subscription(&f.subscription).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, PaymentStatus::Cancelled);
        assert!(d.store.open_payment_for(&f.subscription).unwrap().is_none());

        let cancelled = d.outbox.events("subscription.cancelled");
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0]["data"]["payments_made"], 0);
        assert_eq!(cancelled[0]["data"]["refund_amount"], "0");
        assert_eq!(
            cancelled[0]["data"]["subscription_id"],
            f.subscription.to_string()
        );

        d.clock.set(T0 + MONTH);
        assert_eq!(d.sweep().await.due, 0);
        assert_eq!(d.chain.payments_landed(), 0);
    }

    #[tokio::test]
    async fn test_cancel_after_payments_reports_count() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        for cycle in 1..=2 {
            d.clock.set(T0 + cycle * MONTH);
            d.sweep().await;
        }
        d.chain.cancel(f.subscription);
        d.catch_up().await;

        let cancelled = d.outbox.events("subscription.cancelled");
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0]["data"]["payments_made"], 2);

        let completed = d.store.payments_with_status(PaymentStatus::Completed).unwrap();
        assert_eq!(completed.len(), 2);
        let cancelled_rows = d.store.payments_with_status(PaymentStatus::Cancelled).unwrap();
        assert_eq!(cancelled_rows.len(), 1);
        assert_eq!(cancelled_rows[0].scheduled_for, T0 + 3 * MONTH);

        // Full sync sees the inactive account and schedules nothing.
        let report = d.full_sync().await;
        assert_eq!(report.scheduled, 0);
        assert!(d.store.open_payment_for(&f.subscription).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_payment_racing_unindexed_cancellation_is_rejected() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        // Cancelled on chain, not yet indexed, while the payment comes due.
        d.chain.cancel(f.subscription);
        d.clock.set(T0 + MONTH);

        let report = d.sweep().await;
        assert_eq!(report.failed, 1);
        assert_eq!(d.chain.payments_landed(), 0);

        let failed = d.store.payments_with_status(PaymentStatus::Failed).unwrap();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].error_message.as_deref().unwrap().contains("not active"));

        // Business rejections are not merchant-facing payment failures.
        assert!(d.outbox.events("subscription.payment_failed").is_empty());

        d.catch_up().await;
        let sub = d.store.get_subscription(&f.subscription).unwrap().unwrap();
        assert!(!sub.is_active);
        assert_eq!(d.outbox.events("subscription.cancelled").len(), 1);
    }

    #[tokio::test]
    async fn test_repeated_cancellation_event_notifies_once() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, FEE).await;

        d.chain.cancel(f.subscription);
        d.catch_up().await;
        d.catch_up().await;
        d.full_sync().await;

        assert_eq!(d.outbox.events("subscription.cancelled").len(), 1);
    }
}
