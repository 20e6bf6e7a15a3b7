//! Yield strategy attached to a subscription wallet.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// External yield destination. Encoded on-chain as a 1-byte tag in
/// declaration order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub enum YieldStrategy {
    #[default]
    None,
    MarginfiLend,
    KaminoLend,
    SolendPool,
    DriftDeposit,
}

impl YieldStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            YieldStrategy::None => "none",
            YieldStrategy::MarginfiLend => "marginfi_lend",
            YieldStrategy::KaminoLend => "kamino_lend",
            YieldStrategy::SolendPool => "solend_pool",
            YieldStrategy::DriftDeposit => "drift_deposit",
        }
    }
}

impl fmt::Display for YieldStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
