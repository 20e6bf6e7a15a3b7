//! # Read Services
//!
//! Merchant management and read-only projections over the ledger store,
//! shaped for a dashboard or HTTP API.
//!
//! | API | Operations |
//! |-----|------------|
//! | [`MerchantApi`] | register, update profile, rotate webhook secret, plan catalogue |
//! | [`SubscriptionQueryApi`] | by user / merchant, detail with history, wallets, user stats, upcoming payments |
//! | [`AnalyticsApi`] | revenue, MRR, customers, revenue by day, growth, churn, plan performance |
//!
//! Monthly figures normalize fees to a 30-day month with integer division;
//! churn is reported in basis points. Day buckets are UTC calendar days.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::errors::{ReadError, ReadResult};
pub use domain::views::{
    ChurnReport, Customer, DailyRevenue, DailySubscribers, MerchantAnalytics, MerchantOverview,
    PlanPerformance, PlanQuery, PlanSummary, RegisterMerchant, SubscriptionDetail,
    UpcomingPayment, UserStats,
};
pub use ports::inbound::{AnalyticsApi, MerchantApi, SubscriptionQueryApi};
pub use service::{ReadService, DETAIL_TRANSACTION_LIMIT, WEBHOOK_SECRET_BYTES};
