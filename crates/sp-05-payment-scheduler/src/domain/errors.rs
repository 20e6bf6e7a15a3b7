//! Scheduler errors.
//!
//! [`SchedulerError`] is a failure of the scheduler itself (store or RPC
//! unavailable). [`PaymentFailure`] is why one payment attempt did not go
//! through; it is recorded on the row and decides whether to retry.

use shared_types::{Address, LayoutError, TokenAmount, UnixTimestamp};
use sp_01_chain_gateway::GatewayError;
use sp_03_ledger_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Chain gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[derive(Debug, Error)]
pub enum PaymentFailure {
    #[error("Subscription {0} not found")]
    SubscriptionNotFound(Address),

    #[error("Subscription {0} is not active")]
    SubscriptionInactive(Address),

    #[error("Merchant mismatch: expected {expected}, found {found}")]
    MerchantMismatch { expected: Address, found: Address },

    #[error("Payment not due until {due_at}")]
    NotDue { due_at: UnixTimestamp },

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: TokenAmount,
        available: TokenAmount,
    },

    #[error("Subscription account does not decode: {0}")]
    InvalidAccount(#[from] LayoutError),

    #[error("Chain error: {0}")]
    Chain(#[from] GatewayError),

    #[error("Stuck in processing since {since}")]
    Stuck { since: UnixTimestamp },
}

impl PaymentFailure {
    /// Whether another attempt may succeed. Business rejections are final;
    /// balance shortfalls and chain errors are retried up to the policy's
    /// bound.
    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentFailure::InsufficientBalance { .. }
            | PaymentFailure::Chain(_)
            | PaymentFailure::Stuck { .. } => true,
            PaymentFailure::SubscriptionNotFound(_)
            | PaymentFailure::SubscriptionInactive(_)
            | PaymentFailure::MerchantMismatch { .. }
            | PaymentFailure::NotDue { .. }
            | PaymentFailure::InvalidAccount(_) => false,
        }
    }
}
