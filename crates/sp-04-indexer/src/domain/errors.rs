use shared_types::{Address, LayoutError};
use sp_01_chain_gateway::GatewayError;
use sp_03_ledger_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("Chain gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Program account {0} not found")]
    ProgramNotFound(Address),

    #[error("Program account {0} is not executable")]
    ProgramNotExecutable(Address),

    #[error("Account {0} not found on chain")]
    AccountNotFound(Address),

    #[error("Failed to decode account {address}: {source}")]
    Decode {
        address: Address,
        #[source]
        source: LayoutError,
    },

    #[error("Scheduling failed: {0}")]
    Scheduling(String),
}

pub type IndexerResult<T> = Result<T, IndexerError>;
