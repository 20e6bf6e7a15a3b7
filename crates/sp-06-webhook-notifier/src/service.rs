//! # Webhook Notifier Service
//!
//! Resolves the merchant of a subscription, builds the payload, signs it
//! with the merchant's secret and posts it once. Every outcome is logged
//! and counted; nothing is returned as an error because a failed webhook
//! must never affect indexing or payment state.

use shared_types::{Address, TimeSource, TokenAmount};
use sp_03_ledger_store::{MerchantRepository, Subscription};
use sp_telemetry::WEBHOOK_DELIVERIES;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::errors::WebhookResult;
use crate::domain::payload::WebhookPayload;
use crate::domain::signing;
use crate::ports::outbound::{WebhookRequest, WebhookTransport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Merchant unknown or without a webhook URL.
    Skipped,
    Failed,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::Skipped => "skipped",
            DeliveryOutcome::Failed => "failed",
        }
    }
}

pub struct WebhookNotifier<M: MerchantRepository, T: WebhookTransport> {
    merchants: Arc<M>,
    transport: Arc<T>,
    time: Arc<dyn TimeSource>,
}

impl<M: MerchantRepository, T: WebhookTransport> WebhookNotifier<M, T> {
    pub fn new(merchants: Arc<M>, transport: Arc<T>, time: Arc<dyn TimeSource>) -> Self {
        Self {
            merchants,
            transport,
            time,
        }
    }

    pub async fn subscription_created(&self, subscription: &Subscription) -> DeliveryOutcome {
        let payload = WebhookPayload::subscription_created(subscription, self.time.now_millis());
        self.deliver(&subscription.merchant, &payload).await
    }

    pub async fn payment_succeeded(
        &self,
        subscription: &Subscription,
        amount: TokenAmount,
        payment_number: u32,
        signature: &str,
    ) -> DeliveryOutcome {
        let payload = WebhookPayload::payment_succeeded(
            subscription,
            amount,
            payment_number,
            signature,
            self.time.now_millis(),
        );
        self.deliver(&subscription.merchant, &payload).await
    }

    pub async fn payment_failed(
        &self,
        subscription: &Subscription,
        amount_required: TokenAmount,
        balance_available: TokenAmount,
        failure_count: u32,
        error: &str,
    ) -> DeliveryOutcome {
        let payload = WebhookPayload::payment_failed(
            subscription,
            amount_required,
            balance_available,
            failure_count,
            error,
            self.time.now_millis(),
        );
        self.deliver(&subscription.merchant, &payload).await
    }

    pub async fn subscription_cancelled(
        &self,
        subscription: &Subscription,
        payments_made: u32,
    ) -> DeliveryOutcome {
        let payload = WebhookPayload::subscription_cancelled(
            subscription,
            payments_made,
            self.time.now_millis(),
        );
        self.deliver(&subscription.merchant, &payload).await
    }

    /// Sign and send `payload` to `merchant`'s endpoint.
    pub async fn deliver(&self, merchant: &Address, payload: &WebhookPayload) -> DeliveryOutcome {
        let event = payload.event.as_str();
        let outcome = match self.try_deliver(merchant, payload).await {
            Ok(true) => {
                info!(event, merchant = %merchant, "[sp-06] Webhook delivered");
                DeliveryOutcome::Delivered
            }
            Ok(false) => DeliveryOutcome::Skipped,
            Err(e) => {
                warn!(event, merchant = %merchant, error = %e, "[sp-06] Webhook delivery failed");
                DeliveryOutcome::Failed
            }
        };
        WEBHOOK_DELIVERIES
            .with_label_values(&[event, outcome.as_str()])
            .inc();
        outcome
    }

    /// `Ok(false)` when there is nowhere to send.
    async fn try_deliver(
        &self,
        merchant: &Address,
        payload: &WebhookPayload,
    ) -> WebhookResult<bool> {
        let Some(record) = self.merchants.get_merchant(merchant)? else {
            debug!(merchant = %merchant, "[sp-06] No registered merchant, webhook skipped");
            return Ok(false);
        };
        let Some(url) = record.webhook_url.filter(|u| !u.trim().is_empty()) else {
            warn!(merchant = %merchant, "[sp-06] Merchant has no webhook URL configured");
            return Ok(false);
        };

        let body = payload.to_body()?;
        let request = WebhookRequest {
            signature: signing::sign(&record.webhook_secret, &body),
            url,
            body,
            timestamp: payload.timestamp,
        };
        self.transport.send(&request).await?;
        Ok(true)
    }
}
