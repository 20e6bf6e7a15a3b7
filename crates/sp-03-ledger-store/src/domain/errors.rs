//! # Store Errors

use shared_types::Address;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::PaymentStatus;

/// Key-value backend errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },

    #[error("Key not found in KV store")]
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(transparent)]
    Kv(#[from] KVStoreError),

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(Address),

    #[error("Merchant plan not found: {0}")]
    PlanNotFound(Address),

    #[error("Subscription wallet not found: {0}")]
    WalletNotFound(Address),

    #[error("Merchant not found: {0}")]
    MerchantNotFound(Address),

    #[error("Scheduled payment not found: {0}")]
    PaymentNotFound(Uuid),

    /// A wallet's yield strategy can only be chosen once.
    #[error("Yield already enabled for wallet {0}")]
    YieldAlreadyEnabled(Address),

    #[error("Scheduled payment {id}: cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: Uuid,
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Amount overflow while accumulating {field}")]
    AmountOverflow { field: &'static str },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        StoreError::Serialization {
            message: e.to_string(),
        }
    }
}
