//! Webhook errors.
//!
//! None of these escape [`WebhookNotifier`](crate::WebhookNotifier); they
//! are logged and counted there.

use sp_03_ledger_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint responded with status {0}")]
    Status(u16),

    #[error("Payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type WebhookResult<T> = Result<T, WebhookError>;
