use shared_types::Address;
use sp_03_ledger_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Merchant {0} not found")]
    MerchantNotFound(Address),

    #[error("Subscription {0} not found")]
    SubscriptionNotFound(Address),

    #[error("Wallet {0} not found")]
    WalletNotFound(Address),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type ReadResult<T> = Result<T, ReadError>;
