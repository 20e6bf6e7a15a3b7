//! # Outbound Ports
//!
//! Merchant lookup goes through
//! [`MerchantRepository`](sp_03_ledger_store::MerchantRepository); the HTTP
//! POST itself is [`WebhookTransport`].

use async_trait::async_trait;

use crate::domain::errors::WebhookResult;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";

/// A signed request ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    pub url: String,
    pub body: Vec<u8>,
    /// Hex HMAC-SHA256 of `body`.
    pub signature: String,
    /// Epoch milliseconds, same value as the payload's `timestamp`.
    pub timestamp: i64,
}

#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// POST once. Non-2xx responses are errors.
    async fn send(&self, request: &WebhookRequest) -> WebhookResult<()>;
}
