use shared_types::{Address, TokenAmount, UnixTimestamp};
use sp_03_ledger_store::{LedgerRepository, TransactionKind, TransactionStatus};
use std::collections::HashMap;

use super::ReadService;
use crate::domain::aggregate::{basis_points, cumulative_by_day, sum_by_day, SECONDS_PER_DAY};
use crate::domain::errors::ReadResult;
use crate::domain::views::{
    ChurnReport, Customer, DailyRevenue, DailySubscribers, MerchantAnalytics, PlanPerformance,
    PlanSummary,
};
use crate::ports::inbound::{AnalyticsApi, SubscriptionQueryApi};

impl<S: LedgerRepository> ReadService<S> {
    fn window_start(&self, days: u32) -> UnixTimestamp {
        self.now()
            .saturating_sub(i64::from(days).saturating_mul(SECONDS_PER_DAY))
    }
}

impl<S: LedgerRepository> AnalyticsApi for ReadService<S> {
    fn merchant_analytics(&self, merchant: &Address) -> ReadResult<MerchantAnalytics> {
        let plans = self.store.plans_by_merchant(merchant)?;
        let subscriptions = self.store.subscriptions_by_merchant(merchant)?;

        let total_revenue = plans
            .iter()
            .fold(TokenAmount::zero(), |sum, p| sum.saturating_add(p.total_revenue));
        let active: Vec<_> = subscriptions.iter().filter(|s| s.is_active).collect();
        let monthly_recurring_revenue = active
            .iter()
            .fold(TokenAmount::zero(), |sum, s| sum.saturating_add(s.monthly_fee()));

        Ok(MerchantAnalytics {
            total_revenue,
            active_subscribers: active.len(),
            total_plans: plans.len(),
            monthly_recurring_revenue,
            plans: plans
                .into_iter()
                .map(|p| PlanSummary {
                    plan_id: p.plan_id,
                    plan_name: p.plan_name,
                    subscribers: p.total_subscribers,
                    revenue: p.total_revenue,
                })
                .collect(),
        })
    }

    fn customers(&self, merchant: &Address) -> ReadResult<Vec<Customer>> {
        let mut customers: Vec<Customer> = Vec::new();
        let mut index: HashMap<Address, usize> = HashMap::new();

        for subscription in self.subscriptions_by_merchant(merchant)? {
            let slot = *index.entry(subscription.user).or_insert_with(|| {
                customers.push(Customer {
                    user_wallet: subscription.user,
                    subscriptions: Vec::new(),
                    total_spent: TokenAmount::zero(),
                    active_subscriptions: 0,
                });
                customers.len() - 1
            });
            let customer = &mut customers[slot];
            customer.total_spent = customer.total_spent.saturating_add(subscription.total_paid);
            if subscription.is_active {
                customer.active_subscriptions += 1;
            }
            customer.subscriptions.push(subscription);
        }
        Ok(customers)
    }

    fn revenue_by_day(&self, merchant: &Address, days: u32) -> ReadResult<Vec<DailyRevenue>> {
        let from = self.window_start(days);
        let now = self.now();
        let payments = self
            .store
            .all_transactions()?
            .into_iter()
            .filter(|r| r.kind == TransactionKind::Payment)
            .filter(|r| r.status == TransactionStatus::Success)
            .filter(|r| r.to.as_ref() == Some(merchant))
            .filter_map(|r| r.block_time.map(|t| (t, r.amount)))
            .filter(|(t, _)| *t >= from && *t <= now);

        Ok(sum_by_day(payments)
            .into_iter()
            .map(|(date, revenue)| DailyRevenue { date, revenue })
            .collect())
    }

    fn subscriber_growth(
        &self,
        merchant: &Address,
        days: u32,
    ) -> ReadResult<Vec<DailySubscribers>> {
        let from = self.window_start(days);
        let now = self.now();
        let created = self
            .store
            .subscriptions_by_merchant(merchant)?
            .into_iter()
            .map(|s| s.created_at)
            .filter(|t| *t >= from && *t <= now);

        Ok(cumulative_by_day(created)
            .into_iter()
            .map(|(date, subscribers)| DailySubscribers { date, subscribers })
            .collect())
    }

    fn churn(&self, merchant: &Address) -> ReadResult<ChurnReport> {
        let subscriptions = self.store.subscriptions_by_merchant(merchant)?;
        let total = subscriptions.len();
        let cancelled = subscriptions.iter().filter(|s| !s.is_active).count();
        Ok(ChurnReport {
            total_subscriptions: total,
            cancelled_subscriptions: cancelled,
            churn_rate_bps: basis_points(cancelled, total),
        })
    }

    fn plan_performance(&self, merchant: &Address) -> ReadResult<Vec<PlanPerformance>> {
        let mut performance: Vec<PlanPerformance> = self
            .store
            .plans_by_merchant(merchant)?
            .into_iter()
            .map(|p| PlanPerformance {
                avg_revenue_per_subscriber: p
                    .total_revenue
                    .checked_div_u64(u64::from(p.total_subscribers))
                    .unwrap_or_default(),
                plan_id: p.plan_id,
                plan_name: p.plan_name,
                subscribers: p.total_subscribers,
                revenue: p.total_revenue,
            })
            .collect();
        performance.sort_by(|a, b| b.subscribers.cmp(&a.subscribers));
        Ok(performance)
    }
}
