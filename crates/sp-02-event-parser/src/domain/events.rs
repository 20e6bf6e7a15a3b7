//! # Program Events
//!
//! Closed set of events the subscription program emits. Each variant
//! carries its own typed payload; anything with an unrecognized
//! discriminator becomes [`ProgramEvent::Unknown`].

use borsh::{BorshDeserialize, BorshSerialize};
use serde::Deserialize;
use shared_types::layout::event_discriminator;
use shared_types::{Address, Discriminator};

use crate::legacy::{flex_u32, flex_u64};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SubscriptionWalletCreated {
    pub wallet_pda: Address,
    pub owner: Address,
    pub mint: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct YieldEnabled {
    pub wallet_pda: Address,
    #[serde(deserialize_with = "flex_u64")]
    pub shares_issued: u64,
    #[serde(deserialize_with = "flex_u64")]
    pub usdc_amount: u64,
    #[serde(deserialize_with = "flex_u64")]
    pub buffer_amount: u64,
}

/// Payload shared by `WalletDeposit` and `WalletWithdrawal`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct WalletTransfer {
    pub wallet_pda: Address,
    pub user: Address,
    #[serde(deserialize_with = "flex_u64")]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SubscriptionCreated {
    pub subscription_pda: Address,
    pub user: Address,
    pub wallet: Address,
    pub merchant: Address,
    pub plan_id: String,
    #[serde(default)]
    pub session_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct PaymentExecuted {
    pub subscription_pda: Address,
    pub wallet_pda: Address,
    pub user: Address,
    pub merchant: Address,
    #[serde(deserialize_with = "flex_u64")]
    pub amount: u64,
    #[serde(deserialize_with = "flex_u64")]
    pub protocol_fee: u64,
    #[serde(deserialize_with = "flex_u64")]
    pub merchant_received: u64,
    #[serde(deserialize_with = "flex_u32")]
    pub payment_number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct SubscriptionCancelled {
    pub subscription_pda: Address,
    pub wallet_pda: Address,
    pub user: Address,
    pub merchant: Address,
    #[serde(deserialize_with = "flex_u32")]
    pub payments_made: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct YieldClaimed {
    pub wallet_pda: Address,
    pub owner: Address,
    #[serde(deserialize_with = "flex_u64")]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct MerchantPlanRegistered {
    pub plan_pda: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramEvent {
    SubscriptionWalletCreated(SubscriptionWalletCreated),
    YieldEnabled(YieldEnabled),
    WalletDeposit(WalletTransfer),
    WalletWithdrawal(WalletTransfer),
    SubscriptionCreated(SubscriptionCreated),
    PaymentExecuted(PaymentExecuted),
    SubscriptionCancelled(SubscriptionCancelled),
    YieldClaimed(YieldClaimed),
    MerchantPlanRegistered(MerchantPlanRegistered),
    /// A well-formed `Program data:` payload with a discriminator this
    /// crate does not know (other program events, newer program versions).
    Unknown { discriminator: Discriminator },
}

/// Names of every known event, in the order they are tried when matching
/// legacy `Program log: <Name>: {json}` lines.
pub const KNOWN_EVENTS: [&str; 9] = [
    "SubscriptionWalletCreated",
    "YieldEnabled",
    "WalletDeposit",
    "WalletWithdrawal",
    "SubscriptionCreated",
    "PaymentExecuted",
    "SubscriptionCancelled",
    "YieldClaimed",
    "MerchantPlanRegistered",
];

impl ProgramEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ProgramEvent::SubscriptionWalletCreated(_) => "SubscriptionWalletCreated",
            ProgramEvent::YieldEnabled(_) => "YieldEnabled",
            ProgramEvent::WalletDeposit(_) => "WalletDeposit",
            ProgramEvent::WalletWithdrawal(_) => "WalletWithdrawal",
            ProgramEvent::SubscriptionCreated(_) => "SubscriptionCreated",
            ProgramEvent::PaymentExecuted(_) => "PaymentExecuted",
            ProgramEvent::SubscriptionCancelled(_) => "SubscriptionCancelled",
            ProgramEvent::YieldClaimed(_) => "YieldClaimed",
            ProgramEvent::MerchantPlanRegistered(_) => "MerchantPlanRegistered",
            ProgramEvent::Unknown { .. } => "Unknown",
        }
    }

    pub fn discriminator(&self) -> Discriminator {
        match self {
            ProgramEvent::Unknown { discriminator } => *discriminator,
            known => event_discriminator(known.name()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ProgramEvent::Unknown { .. })
    }
}
