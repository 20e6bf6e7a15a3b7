//! # Webhook Scenarios
//!
//! Every notification is signed with the merchant's current secret, and a
//! failing endpoint never changes the outcome of the work that triggered
//! it.

#[cfg(test)]
mod tests {
    use sp_03_ledger_store::{PaymentStatus, ScheduledPaymentRepository, SubscriptionRepository};
    use sp_06_webhook_notifier::verify;
    use sp_07_read_services::MerchantApi;

    use crate::harness::{Deployment, Fixture, FEE, MONTH, T0, WEBHOOK_URL};

    #[tokio::test]
    async fn test_lifecycle_webhooks_are_signed_with_merchant_secret() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;
        d.clock.set(T0 + MONTH);
        d.sweep().await;
        d.chain.cancel(f.subscription);
        d.catch_up().await;

        let events: Vec<String> = d
            .outbox
            .bodies()
            .iter()
            .map(|body| body["event"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            events,
            vec![
                "subscription.created",
                "subscription.payment_succeeded",
                "subscription.cancelled",
            ]
        );

        assert!(d.outbox.all_signed_with(&f.secret));
        assert!(!d.outbox.all_signed_with("not-the-secret"));
        for request in d.outbox.requests() {
            assert_eq!(request.url, WEBHOOK_URL);
            assert!(!request.signature.is_empty());
        }

        let created = &d.outbox.events("subscription.created")[0];
        assert_eq!(created["data"]["user_wallet"], f.user.to_string());
        assert_eq!(created["data"]["plan_id"], "pro");
        assert_eq!(created["data"]["amount_prepaid"], "0");
        assert_eq!(created["timestamp"], T0 * 1_000);
    }

    #[tokio::test]
    async fn test_rotated_secret_signs_later_events() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        let rotated = d.reads().regenerate_webhook_secret(&f.merchant).unwrap();
        assert_ne!(rotated, f.secret);

        d.clock.set(T0 + MONTH);
        d.sweep().await;

        let requests = d.outbox.requests();
        assert_eq!(requests.len(), 2);
        let (before, after) = (&requests[0], &requests[1]);
        assert!(verify(&f.secret, &before.body, &before.signature));
        assert!(!verify(&rotated, &before.body, &before.signature));
        assert!(verify(&rotated, &after.body, &after.signature));
        assert!(!verify(&f.secret, &after.body, &after.signature));
    }

    #[tokio::test]
    async fn test_failing_endpoint_does_not_affect_payment() {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        d.outbox.reject_with(Some(500));
        d.clock.set(T0 + MONTH);
        let report = d.sweep().await;
        assert_eq!(report.completed, 1);

        let sub = d.store.get_subscription(&f.subscription).unwrap().unwrap();
        assert_eq!(sub.payment_count, 1);
        let completed = d.store.payments_with_status(PaymentStatus::Completed).unwrap();
        assert_eq!(completed.len(), 1);
        assert!(d.store.open_payment_for(&f.subscription).unwrap().is_some());

        // Failed deliveries are not retried later.
        d.outbox.reject_with(None);
        d.catch_up().await;
        assert!(d.outbox.events("subscription.payment_succeeded").is_empty());
    }

    #[tokio::test]
    async fn test_merchant_without_endpoint_gets_no_requests() {
        let d = Deployment::new();
        d.boot().await;
        let merchant = d.chain.fresh_address(0x41);
        let user = d.chain.fresh_address(0x51);
        let plan = d.chain.register_plan(merchant, "basic", FEE, MONTH);
        let wallet = d.chain.create_wallet(user, 5 * FEE);
        let subscription = d.chain.subscribe(user, wallet, plan);
        d.catch_up().await;

        d.clock.set(T0 + MONTH);
        assert_eq!(d.sweep().await.completed, 1);
        assert!(d.outbox.requests().is_empty());
        assert_eq!(
            d.store.get_subscription(&subscription).unwrap().unwrap().payment_count,
            1
        );
    }
}
