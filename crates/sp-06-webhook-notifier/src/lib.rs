//! # Webhook Notifier
//!
//! Signed HTTP notifications to merchants.
//!
//! | Event | Sent by | Data |
//! |-------|---------|------|
//! | `subscription.created` | indexer | `subscription_id`, `user_wallet`, `plan_id`, `amount_prepaid` |
//! | `subscription.payment_succeeded` | scheduler | `subscription_id`, `user_wallet`, `amount`, `payment_number`, `signature` |
//! | `subscription.payment_failed` | scheduler, terminal failures only | `subscription_id`, `user_wallet`, `amount_required`, `balance_available`, `failure_count`, `error` |
//! | `subscription.cancelled` | indexer | `subscription_id`, `user_wallet`, `refund_amount`, `payments_made` |
//!
//! ## Request
//!
//! ```text
//! POST <merchant webhook_url>
//! Content-Type: application/json
//! X-Webhook-Signature: hex(HMAC-SHA256(webhook_secret, body))
//! X-Webhook-Timestamp: <payload timestamp, epoch ms>
//!
//! {"event":"subscription.payment_succeeded","timestamp":1700000000000,"data":{...}}
//! ```
//!
//! Receivers check the signature with [`verify`], which compares in
//! constant time. Each notification is attempted once with a 10 second
//! timeout; failures are logged and counted, never retried or propagated.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::http::HttpTransport;
pub use config::WebhookConfig;
pub use domain::errors::{WebhookError, WebhookResult};
pub use domain::payload::{WebhookData, WebhookEvent, WebhookPayload};
pub use domain::signing::{sign, verify};
pub use ports::outbound::{WebhookRequest, WebhookTransport, SIGNATURE_HEADER, TIMESTAMP_HEADER};
pub use service::{DeliveryOutcome, WebhookNotifier};
