//! # Log Subscription Client
//!
//! Keeps a `logsSubscribe` subscription alive over WebSocket and forwards
//! every notification into an mpsc channel. Dropped connections are
//! re-established with exponential backoff; the indexer's backfill covers
//! whatever was missed while disconnected.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_types::Address;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::domain::errors::{GatewayError, GatewayResult};
use crate::domain::types::{Commitment, LogNotification};

/// Reconnection attempts without a successful subscription before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Base delay between reconnection attempts (exponential backoff).
const RECONNECT_BASE_DELAY_SECS: u64 = 2;

/// Maximum delay between reconnection attempts.
const MAX_RECONNECT_DELAY_SECS: u64 = 60;

const SUBSCRIBE_REQUEST_ID: u64 = 1;

#[derive(Debug, Serialize)]
struct WsRequest<T: Serialize> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct WsMessage {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<WsRpcError>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    params: Option<NotificationParams>,
}

#[derive(Debug, Deserialize)]
struct WsRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    subscription: Value,
    result: LogsResult,
}

#[derive(Debug, Deserialize)]
struct LogsResult {
    context: SlotContext,
    value: LogsValue,
}

#[derive(Debug, Deserialize)]
struct SlotContext {
    slot: u64,
}

#[derive(Debug, Deserialize)]
struct LogsValue {
    signature: String,
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    logs: Vec<String>,
}

/// What a single text frame turned out to be.
#[derive(Debug, PartialEq)]
enum Frame {
    Subscribed(Value),
    Notification(LogNotification),
    Error(String),
    Ignored,
}

fn classify_frame(text: &str, subscription: Option<&Value>) -> Frame {
    let Ok(message) = serde_json::from_str::<WsMessage>(text) else {
        return Frame::Ignored;
    };

    if let Some(error) = message.error {
        return Frame::Error(format!("{} ({})", error.message, error.code));
    }

    if message.id == Some(SUBSCRIBE_REQUEST_ID) {
        if let Some(result) = message.result {
            return Frame::Subscribed(result);
        }
    }

    if message.method.as_deref() == Some("logsNotification") {
        if let Some(params) = message.params {
            if Some(&params.subscription) == subscription {
                let LogsResult { context, value } = params.result;
                return Frame::Notification(LogNotification {
                    signature: value.signature,
                    slot: context.slot,
                    logs: value.logs,
                    failed: value.err.is_some(),
                });
            }
        }
    }

    Frame::Ignored
}

fn calculate_backoff_delay(attempts: u32) -> u64 {
    std::cmp::min(
        RECONNECT_BASE_DELAY_SECS.saturating_mul(1 << attempts.min(6)),
        MAX_RECONNECT_DELAY_SECS,
    )
}

enum ConnectionEnd {
    ReceiverDropped,
    ServerClosed,
}

pub struct LogSubscriber {
    ws_url: String,
    program_id: Address,
    commitment: Commitment,
}

impl LogSubscriber {
    pub fn new(ws_url: impl Into<String>, program_id: Address, commitment: Commitment) -> Self {
        Self {
            ws_url: ws_url.into(),
            program_id,
            commitment,
        }
    }

    /// Run the subscription in the background until `tx`'s receiver is
    /// dropped or reconnection gives up.
    pub fn spawn(self, tx: mpsc::Sender<LogNotification>) -> JoinHandle<()> {
        tokio::spawn(self.connection_loop(tx))
    }

    async fn connection_loop(self, tx: mpsc::Sender<LogNotification>) {
        let mut reconnect_attempts = 0u32;

        loop {
            match self.run_connection(&tx, &mut reconnect_attempts).await {
                Ok(ConnectionEnd::ReceiverDropped) => {
                    debug!("[sp-01] Log stream receiver dropped, closing subscription");
                    break;
                }
                Ok(ConnectionEnd::ServerClosed) => {
                    warn!("[sp-01] Log subscription closed by server");
                }
                Err(e) => {
                    warn!(error = %e, "[sp-01] Log subscription connection failed");
                }
            }

            reconnect_attempts += 1;
            if reconnect_attempts >= MAX_RECONNECT_ATTEMPTS {
                error!(
                    attempts = reconnect_attempts,
                    "[sp-01] Log subscription reconnection failed, giving up"
                );
                break;
            }
            if tx.is_closed() {
                break;
            }

            let delay_secs = calculate_backoff_delay(reconnect_attempts);
            info!(
                delay_secs,
                attempt = reconnect_attempts,
                "[sp-01] Reconnecting log subscription"
            );
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        }
    }

    async fn run_connection(
        &self,
        tx: &mpsc::Sender<LogNotification>,
        reconnect_attempts: &mut u32,
    ) -> GatewayResult<ConnectionEnd> {
        let (ws_stream, _) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| GatewayError::WebSocket(format!("connect {}: {}", self.ws_url, e)))?;

        let (mut write, mut read) = ws_stream.split();

        let request = WsRequest {
            jsonrpc: "2.0",
            method: "logsSubscribe",
            params: json!([
                { "mentions": [self.program_id.to_string()] },
                { "commitment": self.commitment.as_str() }
            ]),
            id: SUBSCRIBE_REQUEST_ID,
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        write
            .send(Message::Text(body.into()))
            .await
            .map_err(|e| GatewayError::WebSocket(format!("subscribe: {}", e)))?;

        let mut subscription: Option<Value> = None;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => match classify_frame(&text, subscription.as_ref()) {
                    Frame::Subscribed(id) => {
                        info!(
                            subscription = %id,
                            program = %self.program_id,
                            "[sp-01] Log subscription active"
                        );
                        subscription = Some(id);
                        *reconnect_attempts = 0;
                    }
                    Frame::Notification(notification) => {
                        if tx.send(notification).await.is_err() {
                            return Ok(ConnectionEnd::ReceiverDropped);
                        }
                    }
                    Frame::Error(message) => {
                        return Err(GatewayError::WebSocket(message));
                    }
                    Frame::Ignored => {}
                },
                Ok(Message::Ping(data)) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Ok(Message::Close(_)) => return Ok(ConnectionEnd::ServerClosed),
                Ok(_) => {}
                Err(e) => return Err(GatewayError::WebSocket(e.to_string())),
            }
        }

        Ok(ConnectionEnd::ServerClosed)
    }
}
