//! Response shapes of the read services. Amounts stay [`TokenAmount`]
//! and serialize as decimal strings.

use chrono::NaiveDate;
use serde::Serialize;
use shared_types::{Address, TokenAmount, UnixTimestamp};
use sp_03_ledger_store::{Merchant, MerchantPlan, Subscription, TransactionRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterMerchant {
    pub wallet: Address,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub logo_url: Option<String>,
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MerchantOverview {
    pub merchant: Merchant,
    /// Newest first.
    pub plans: Vec<MerchantPlan>,
}

/// Filters for the public plan catalogue. Only active plans are listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanQuery {
    pub category: Option<String>,
    pub min_fee: Option<TokenAmount>,
    pub max_fee: Option<TokenAmount>,
    /// Case-insensitive substring of the plan name or description.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionDetail {
    pub subscription: Subscription,
    /// Newest first.
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub total_subscriptions: usize,
    pub active_subscriptions: usize,
    pub total_spent: TokenAmount,
    pub subscriptions: Vec<Subscription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingPayment {
    pub subscription: Address,
    pub merchant: Address,
    pub amount: TokenAmount,
    pub next_payment_at: UnixTimestamp,
    /// Whole days until due, rounded up; negative when overdue.
    pub days_until: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub plan_id: String,
    pub plan_name: String,
    pub subscribers: u32,
    pub revenue: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MerchantAnalytics {
    pub total_revenue: TokenAmount,
    pub active_subscribers: usize,
    pub total_plans: usize,
    /// Active subscription fees normalized to a 30-day month.
    pub monthly_recurring_revenue: TokenAmount,
    pub plans: Vec<PlanSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub user_wallet: Address,
    pub subscriptions: Vec<Subscription>,
    pub total_spent: TokenAmount,
    pub active_subscriptions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRevenue {
    pub date: NaiveDate,
    pub revenue: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySubscribers {
    pub date: NaiveDate,
    /// Subscriptions created in the window up to and including `date`.
    pub subscribers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChurnReport {
    pub total_subscriptions: usize,
    pub cancelled_subscriptions: usize,
    /// Cancelled share in basis points (10_000 = 100%).
    pub churn_rate_bps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanPerformance {
    pub plan_id: String,
    pub plan_name: String,
    pub subscribers: u32,
    pub revenue: TokenAmount,
    pub avg_revenue_per_subscriber: TokenAmount,
}
