//! # Webhook Payloads
//!
//! Wire shape: `{"event": "...", "timestamp": <epoch ms>, "data": {...}}`
//! with snake_case data keys. Amounts are decimal strings and addresses
//! base58, as everywhere else.

use serde::Serialize;
use shared_types::{Address, TokenAmount};
use sp_03_ledger_store::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WebhookEvent {
    #[serde(rename = "subscription.created")]
    SubscriptionCreated,
    #[serde(rename = "subscription.payment_succeeded")]
    PaymentSucceeded,
    #[serde(rename = "subscription.payment_failed")]
    PaymentFailed,
    #[serde(rename = "subscription.cancelled")]
    SubscriptionCancelled,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::SubscriptionCreated => "subscription.created",
            WebhookEvent::PaymentSucceeded => "subscription.payment_succeeded",
            WebhookEvent::PaymentFailed => "subscription.payment_failed",
            WebhookEvent::SubscriptionCancelled => "subscription.cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionCreatedData {
    pub subscription_id: Address,
    pub user_wallet: Address,
    pub plan_id: String,
    /// Always zero: subscriptions pay per cycle from the wallet.
    pub amount_prepaid: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSucceededData {
    pub subscription_id: Address,
    pub user_wallet: Address,
    pub amount: TokenAmount,
    pub payment_number: u32,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentFailedData {
    pub subscription_id: Address,
    pub user_wallet: Address,
    pub amount_required: TokenAmount,
    pub balance_available: TokenAmount,
    pub failure_count: u32,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionCancelledData {
    pub subscription_id: Address,
    pub user_wallet: Address,
    /// Always zero: cancellation never refunds.
    pub refund_amount: TokenAmount,
    pub payments_made: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WebhookData {
    SubscriptionCreated(SubscriptionCreatedData),
    PaymentSucceeded(PaymentSucceededData),
    PaymentFailed(PaymentFailedData),
    SubscriptionCancelled(SubscriptionCancelledData),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload {
    pub event: WebhookEvent,
    /// Epoch milliseconds, echoed in `X-Webhook-Timestamp`.
    pub timestamp: i64,
    pub data: WebhookData,
}

impl WebhookPayload {
    pub fn subscription_created(subscription: &Subscription, timestamp: i64) -> Self {
        Self {
            event: WebhookEvent::SubscriptionCreated,
            timestamp,
            data: WebhookData::SubscriptionCreated(SubscriptionCreatedData {
                subscription_id: subscription.address,
                user_wallet: subscription.user,
                plan_id: subscription.plan_id.clone(),
                amount_prepaid: TokenAmount::zero(),
            }),
        }
    }

    pub fn payment_succeeded(
        subscription: &Subscription,
        amount: TokenAmount,
        payment_number: u32,
        signature: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            event: WebhookEvent::PaymentSucceeded,
            timestamp,
            data: WebhookData::PaymentSucceeded(PaymentSucceededData {
                subscription_id: subscription.address,
                user_wallet: subscription.user,
                amount,
                payment_number,
                signature: signature.into(),
            }),
        }
    }

    pub fn payment_failed(
        subscription: &Subscription,
        amount_required: TokenAmount,
        balance_available: TokenAmount,
        failure_count: u32,
        error: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            event: WebhookEvent::PaymentFailed,
            timestamp,
            data: WebhookData::PaymentFailed(PaymentFailedData {
                subscription_id: subscription.address,
                user_wallet: subscription.user,
                amount_required,
                balance_available,
                failure_count,
                error: error.into(),
            }),
        }
    }

    pub fn subscription_cancelled(
        subscription: &Subscription,
        payments_made: u32,
        timestamp: i64,
    ) -> Self {
        Self {
            event: WebhookEvent::SubscriptionCancelled,
            timestamp,
            data: WebhookData::SubscriptionCancelled(SubscriptionCancelledData {
                subscription_id: subscription.address,
                user_wallet: subscription.user,
                refund_amount: TokenAmount::zero(),
                payments_made,
            }),
        }
    }

    /// The exact bytes that are signed and sent.
    pub fn to_body(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
