//! Captures webhook requests instead of sending them.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sp_06_webhook_notifier::{
    verify, WebhookError, WebhookRequest, WebhookResult, WebhookTransport,
};

#[derive(Default)]
pub struct WebhookOutbox {
    sent: Mutex<Vec<WebhookRequest>>,
    /// Status returned instead of accepting, for endpoint failure tests.
    reject_with: Mutex<Option<u16>>,
}

impl WebhookOutbox {
    pub fn reject_with(&self, status: Option<u16>) {
        *self.reject_with.lock() = status;
    }

    pub fn requests(&self) -> Vec<WebhookRequest> {
        self.sent.lock().clone()
    }

    /// Parsed bodies of every accepted request, oldest first.
    pub fn bodies(&self) -> Vec<Value> {
        self.sent
            .lock()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }

    /// Bodies of one event type.
    pub fn events(&self, event: &str) -> Vec<Value> {
        self.bodies()
            .into_iter()
            .filter(|body| body["event"] == event)
            .collect()
    }

    pub fn all_signed_with(&self, secret: &str) -> bool {
        self.sent
            .lock()
            .iter()
            .all(|request| verify(secret, &request.body, &request.signature))
    }
}

#[async_trait]
impl WebhookTransport for WebhookOutbox {
    async fn send(&self, request: &WebhookRequest) -> WebhookResult<()> {
        if let Some(status) = *self.reject_with.lock() {
            return Err(WebhookError::Status(status));
        }
        self.sent.lock().push(request.clone());
        Ok(())
    }
}
