//! # Payment Scheduler (sp-05)
//!
//! Drives recurring payments for active subscriptions.
//!
//! ## Row Lifecycle
//!
//! ```text
//! pending ──► processing ──► completed ──► (purged after retention)
//!    ▲            │
//!    └── retry ───┤
//!                 └──► failed (not retryable, or attempts exhausted)
//! pending ──► cancelled (subscription cancelled)
//! ```
//!
//! Each subscription has at most one open (`pending` or `processing`) row.
//! A completed payment queues the next cycle at
//! `last_payment_timestamp + payment_interval`.
//!
//! ## Failure Handling
//!
//! | Failure | Retried |
//! |---------|---------|
//! | subscription missing, inactive, or merchant mismatch | no |
//! | payment not yet due on chain | no |
//! | insufficient balance | yes, up to `max_retries` |
//! | RPC / submission / confirmation errors | yes, up to `max_retries` |
//! | stuck in `processing` | yes, up to `max_retries` |
//!
//! Exhausting the attempts fires exactly one payment-failed notification.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::SchedulerConfig;
pub use domain::errors::{PaymentFailure, SchedulerError, SchedulerResult};
pub use domain::outcome::{
    MaintenanceReport, PaymentFailed, PaymentOutcome, PaymentSucceeded, SweepOutcome,
    SweepReport,
};
pub use domain::retry::RetryPolicy;
pub use ports::outbound::PaymentNotifier;
pub use service::PaymentScheduler;
