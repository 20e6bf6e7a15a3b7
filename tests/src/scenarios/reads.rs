//! # Read Service Scenarios
//!
//! Dashboard queries over a projection built by real indexing and payment
//! activity: two subscribers on one plan, one of whom cancels after the
//! first cycle.

#[cfg(test)]
mod tests {
    use shared_types::{Address, TokenAmount};
    use sp_03_ledger_store::TransactionKind;
    use sp_07_read_services::domain::aggregate::utc_day;
    use sp_07_read_services::{AnalyticsApi, MerchantApi, SubscriptionQueryApi};

    use crate::harness::{Deployment, Fixture, FEE, MONTH, T0};

    struct Book {
        d: Deployment,
        f: Fixture,
        churned_user: Address,
        churned: Address,
    }

    /// A subscribes with plenty of funds, B with exactly one payment's
    /// worth. Both pay at `T0 + MONTH`, B cancels, A pays again at
    /// `T0 + 2 * MONTH`.
    async fn book() -> Book {
        let d = Deployment::new();
        d.boot().await;
        let f = Fixture::subscribe(&d, 10 * FEE).await;

        let churned_user = d.chain.fresh_address(0x52);
        let wallet = d.chain.create_wallet(churned_user, FEE);
        let churned = d.chain.subscribe(churned_user, wallet, f.plan);
        d.catch_up().await;

        d.clock.set(T0 + MONTH);
        assert_eq!(d.sweep().await.completed, 2);
        d.catch_up().await;

        d.clock.advance(86_400);
        d.chain.cancel(churned);
        d.catch_up().await;

        d.clock.set(T0 + 2 * MONTH);
        assert_eq!(d.sweep().await.completed, 1);
        d.catch_up().await;

        Book {
            d,
            f,
            churned_user,
            churned,
        }
    }

    #[tokio::test]
    async fn test_merchant_analytics() {
        let Book { d, f, .. } = book().await;

        let analytics = d.reads().merchant_analytics(&f.merchant).unwrap();
        assert_eq!(analytics.total_revenue, TokenAmount::from_u64(3 * FEE));
        assert_eq!(analytics.active_subscribers, 1);
        assert_eq!(analytics.total_plans, 1);
        assert_eq!(analytics.monthly_recurring_revenue, TokenAmount::from_u64(FEE));
        assert_eq!(analytics.plans[0].plan_id, "pro");
        assert_eq!(analytics.plans[0].revenue, TokenAmount::from_u64(3 * FEE));

        let churn = d.reads().churn(&f.merchant).unwrap();
        assert_eq!(churn.total_subscriptions, 2);
        assert_eq!(churn.cancelled_subscriptions, 1);
        assert_eq!(churn.churn_rate_bps, 5_000);

        let customers = d.reads().customers(&f.merchant).unwrap();
        assert_eq!(customers.len(), 2);
        let loyal = customers.iter().find(|c| c.user_wallet == f.user).unwrap();
        assert_eq!(loyal.total_spent, TokenAmount::from_u64(2 * FEE));
        assert_eq!(loyal.active_subscriptions, 1);
    }

    #[tokio::test]
    async fn test_revenue_by_day_buckets_payments() {
        let Book { d, f, .. } = book().await;

        let revenue = d.reads().revenue_by_day(&f.merchant, 90).unwrap();
        assert_eq!(revenue.len(), 2);
        assert_eq!(revenue[0].date, utc_day(T0 + MONTH).unwrap());
        assert_eq!(revenue[0].revenue, TokenAmount::from_u64(2 * FEE));
        assert_eq!(revenue[1].date, utc_day(T0 + 2 * MONTH).unwrap());
        assert_eq!(revenue[1].revenue, TokenAmount::from_u64(FEE));

        // A one-week window only sees the latest cycle.
        let recent = d.reads().revenue_by_day(&f.merchant, 7).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].revenue, TokenAmount::from_u64(FEE));

        let growth = d.reads().subscriber_growth(&f.merchant, 90).unwrap();
        assert_eq!(growth.len(), 1);
        assert_eq!(growth[0].subscribers, 2);
    }

    #[tokio::test]
    async fn test_user_views() {
        let Book {
            d,
            f,
            churned_user,
            churned,
        } = book().await;

        let stats = d.reads().user_stats(&churned_user).unwrap();
        assert_eq!(stats.total_subscriptions, 1);
        assert_eq!(stats.active_subscriptions, 0);
        assert_eq!(stats.total_spent, TokenAmount::from_u64(FEE));
        assert_eq!(stats.subscriptions[0].address, churned);

        let upcoming = d.reads().upcoming_payments(&f.user).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].next_payment_at, T0 + 3 * MONTH);
        assert_eq!(upcoming[0].days_until, 30);
        assert!(d.reads().upcoming_payments(&churned_user).unwrap().is_empty());

        let wallet = d.reads().wallet_by_owner(&f.user).unwrap().unwrap();
        assert_eq!(wallet.address, f.wallet);
        assert_eq!(wallet.total_spent, TokenAmount::from_u64(2 * FEE));
    }

    #[tokio::test]
    async fn test_subscription_detail_history() {
        let Book { d, f, churned, .. } = book().await;

        let detail = d.reads().subscription_detail(&f.subscription).unwrap();
        assert_eq!(detail.subscription.payment_count, 2);
        let kinds: Vec<_> = detail.transactions.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::Payment,
                TransactionKind::Payment,
                TransactionKind::SubscriptionCreated,
            ]
        );
        assert_eq!(detail.transactions[0].block_time, Some(T0 + 2 * MONTH));
        assert_eq!(detail.transactions[0].to, Some(f.merchant));
        assert_eq!(detail.transactions[0].from, Some(f.wallet));

        let detail = d.reads().subscription_detail(&churned).unwrap();
        assert!(!detail.subscription.is_active);
        assert_eq!(detail.transactions[0].kind, TransactionKind::Cancel);
        assert_eq!(detail.transactions.len(), 3);

        let overview = d.reads().get_merchant(&f.merchant).unwrap().unwrap();
        assert_eq!(overview.plans.len(), 1);
        assert_eq!(overview.merchant.company_name.as_deref(), Some("Acme Streaming"));
    }
}
