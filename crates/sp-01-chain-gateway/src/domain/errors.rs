//! # Gateway Errors
//!
//! Every failure surfaced by the chain gateway. Callers mostly care about
//! one distinction: can the same request succeed if tried again later
//! ([`GatewayError::is_transient`]) or is the answer final.

use shared_types::{Address, AddressError, LayoutError, TxSignature};
use thiserror::Error;

/// JSON-RPC code returned when simulation of a submitted transaction fails.
pub const RPC_PREFLIGHT_FAILURE: i64 = -32002;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cannot connect to {0}")]
    Connection(String),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Failed to parse RPC response: {0}")]
    Parse(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Account not found: {0}")]
    AccountNotFound(Address),

    #[error("Account data malformed: {0}")]
    Decode(#[from] LayoutError),

    #[error("Address derivation failed: {0}")]
    Address(#[from] AddressError),

    #[error("Transaction encoding failed: {0}")]
    Encode(#[from] bincode::Error),

    /// The cluster refused or failed the transaction. The program's error
    /// logs, when available, are included in the message.
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("Transaction {0} was not confirmed in time")]
    ConfirmationTimeout(TxSignature),

    #[error("Invalid payer keypair: {0}")]
    InvalidKeypair(String),

    #[error("Invalid gateway configuration: {0}")]
    Config(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    /// True for failures that say nothing about the request itself
    /// (network, node health, timeouts).
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Http(_)
            | GatewayError::Connection(_)
            | GatewayError::WebSocket(_)
            | GatewayError::Timeout(_)
            | GatewayError::ConfirmationTimeout(_) => true,
            // -32600..-32602 are malformed requests, retrying cannot help.
            GatewayError::Rpc { code, .. } => !(-32602..=-32600).contains(code),
            GatewayError::Parse(_)
            | GatewayError::AccountNotFound(_)
            | GatewayError::Decode(_)
            | GatewayError::Address(_)
            | GatewayError::Encode(_)
            | GatewayError::TransactionRejected(_)
            | GatewayError::InvalidKeypair(_)
            | GatewayError::Config(_) => false,
        }
    }
}
