//! Routes indexer and scheduler notifications to merchant webhooks.

use std::sync::Arc;

use async_trait::async_trait;
use sp_03_ledger_store::{MerchantRepository, Subscription};
use sp_04_indexer::LifecycleNotifier;
use sp_05_payment_scheduler::{PaymentFailed, PaymentNotifier, PaymentSucceeded};
use sp_06_webhook_notifier::{WebhookNotifier, WebhookTransport};

pub struct WebhookBridge<M: MerchantRepository, T: WebhookTransport> {
    notifier: Arc<WebhookNotifier<M, T>>,
}

impl<M: MerchantRepository, T: WebhookTransport> WebhookBridge<M, T> {
    pub fn new(notifier: Arc<WebhookNotifier<M, T>>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl<M, T> LifecycleNotifier for WebhookBridge<M, T>
where
    M: MerchantRepository + 'static,
    T: WebhookTransport + 'static,
{
    async fn subscription_created(&self, subscription: &Subscription) {
        self.notifier.subscription_created(subscription).await;
    }

    async fn subscription_cancelled(&self, subscription: &Subscription, payments_made: u32) {
        self.notifier
            .subscription_cancelled(subscription, payments_made)
            .await;
    }
}

#[async_trait]
impl<M, T> PaymentNotifier for WebhookBridge<M, T>
where
    M: MerchantRepository + 'static,
    T: WebhookTransport + 'static,
{
    async fn payment_succeeded(&self, subscription: &Subscription, payment: &PaymentSucceeded) {
        self.notifier
            .payment_succeeded(
                subscription,
                payment.amount,
                payment.payment_number,
                &payment.signature,
            )
            .await;
    }

    async fn payment_failed(&self, subscription: &Subscription, failure: &PaymentFailed) {
        self.notifier
            .payment_failed(
                subscription,
                failure.amount_required,
                failure.balance_available,
                failure.failure_count,
                &failure.error,
            )
            .await;
    }
}
