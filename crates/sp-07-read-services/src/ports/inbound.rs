//! # Inbound Ports (Driving Ports)
//!
//! Query and merchant-management APIs for an HTTP layer to expose. All
//! reads are projections over the ledger store; nothing here touches the
//! chain.

use shared_types::Address;
use sp_03_ledger_store::{Merchant, MerchantPlan, MerchantProfile, Subscription, SubscriptionWallet};

use crate::domain::errors::ReadResult;
use crate::domain::views::{
    ChurnReport, Customer, DailyRevenue, DailySubscribers, MerchantAnalytics, MerchantOverview,
    PlanPerformance, PlanQuery, RegisterMerchant, SubscriptionDetail, UpcomingPayment, UserStats,
};

pub trait MerchantApi {
    /// Register a merchant with a fresh webhook secret. Registering an
    /// existing wallet returns the stored merchant unchanged.
    fn register_merchant(&self, request: RegisterMerchant) -> ReadResult<Merchant>;

    /// Overwrite the profile fields that are `Some` in `profile`.
    ///
    /// ## Errors
    ///
    /// - `MerchantNotFound`
    fn update_merchant(&self, wallet: &Address, profile: MerchantProfile) -> ReadResult<Merchant>;

    /// Replace the webhook secret and return the new one. The old secret
    /// stops verifying immediately.
    ///
    /// ## Errors
    ///
    /// - `MerchantNotFound`
    fn regenerate_webhook_secret(&self, wallet: &Address) -> ReadResult<String>;

    fn get_merchant(&self, wallet: &Address) -> ReadResult<Option<MerchantOverview>>;

    /// Plans of `merchant`, newest first.
    fn merchant_plans(&self, merchant: &Address) -> ReadResult<Vec<MerchantPlan>>;

    fn plan_detail(&self, plan: &Address) -> ReadResult<Option<MerchantPlan>>;

    /// Active plans matching `query`, most subscribed first.
    fn search_plans(&self, query: &PlanQuery) -> ReadResult<Vec<MerchantPlan>>;
}

pub trait SubscriptionQueryApi {
    /// Newest first.
    fn subscriptions_by_user(&self, user: &Address) -> ReadResult<Vec<Subscription>>;

    /// Newest first.
    fn subscriptions_by_merchant(&self, merchant: &Address) -> ReadResult<Vec<Subscription>>;

    /// The subscription with its 50 most recent transaction records.
    ///
    /// ## Errors
    ///
    /// - `SubscriptionNotFound`
    fn subscription_detail(&self, subscription: &Address) -> ReadResult<SubscriptionDetail>;

    /// The owner's earliest wallet, if any.
    fn wallet_by_owner(&self, owner: &Address) -> ReadResult<Option<SubscriptionWallet>>;

    /// ## Errors
    ///
    /// - `WalletNotFound`
    fn wallet(&self, wallet: &Address) -> ReadResult<SubscriptionWallet>;

    fn user_stats(&self, user: &Address) -> ReadResult<UserStats>;

    /// Active subscriptions of `user` by next due time, soonest first.
    fn upcoming_payments(&self, user: &Address) -> ReadResult<Vec<UpcomingPayment>>;
}

pub trait AnalyticsApi {
    fn merchant_analytics(&self, merchant: &Address) -> ReadResult<MerchantAnalytics>;

    /// Subscriptions of `merchant` grouped by user, most recent first.
    fn customers(&self, merchant: &Address) -> ReadResult<Vec<Customer>>;

    /// Payment revenue per UTC day over the last `days` days.
    fn revenue_by_day(&self, merchant: &Address, days: u32) -> ReadResult<Vec<DailyRevenue>>;

    /// Cumulative new subscriptions per UTC day over the last `days` days.
    fn subscriber_growth(&self, merchant: &Address, days: u32)
        -> ReadResult<Vec<DailySubscribers>>;

    fn churn(&self, merchant: &Address) -> ReadResult<ChurnReport>;

    /// Most subscribed first.
    fn plan_performance(&self, merchant: &Address) -> ReadResult<Vec<PlanPerformance>>;
}
