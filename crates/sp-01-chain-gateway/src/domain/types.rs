//! Value types exchanged with the cluster.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Slot, TxSignature, UnixTimestamp};
use tokio::sync::mpsc;

/// Cluster commitment level attached to reads and subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }

    /// Whether a status reported by the cluster satisfies this level.
    pub fn is_satisfied_by(&self, reported: &str) -> bool {
        let rank = |s: &str| match s {
            "processed" => 0,
            "confirmed" => 1,
            "finalized" => 2,
            _ => -1,
        };
        rank(reported) >= rank(self.as_str())
    }
}

impl std::str::FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(format!("unknown commitment level: {}", other)),
        }
    }
}

/// One entry from a signature history page (newest first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub signature: TxSignature,
    pub slot: Slot,
    pub block_time: Option<UnixTimestamp>,
    pub failed: bool,
}

/// A confirmed transaction reduced to what the indexer reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedTransaction {
    pub signature: TxSignature,
    pub slot: Slot,
    pub block_time: Option<UnixTimestamp>,
    pub log_messages: Vec<String>,
    pub failed: bool,
}

/// Log notification pushed by the live subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogNotification {
    pub signature: TxSignature,
    pub slot: Slot,
    pub logs: Vec<String>,
    pub failed: bool,
}

/// Raw account contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub address: Address,
    pub owner: Address,
    pub lamports: u64,
    pub executable: bool,
    pub data: Vec<u8>,
}

/// Receiving half of a live log subscription.
///
/// The subscription reconnects on its own; the stream only ends when the
/// gateway gives up or the receiver is dropped.
pub type LogStream = mpsc::Receiver<LogNotification>;

/// Everything the scheduler knows when it asks for a payment to be made.
/// The gateway resolves the remaining accounts itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub subscription: Address,
    pub subscription_wallet: Address,
    pub merchant_plan: Address,
    pub merchant: Address,
    pub mint: Address,
}

/// Proof that a payment transaction landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub signature: TxSignature,
    pub slot: Option<Slot>,
}
