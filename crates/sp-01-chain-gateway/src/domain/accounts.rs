//! # Program Account Layouts
//!
//! Typed views over the four account types the subscription program owns.
//! Field order matches the program exactly; the borsh body is decoded only
//! after the 8-byte account discriminator checks out.

use borsh::{BorshDeserialize, BorshSerialize};
use shared_types::layout::{account_discriminator, decode_prefixed, encode_prefixed};
use shared_types::{Address, Discriminator, LayoutError, YieldStrategy};

/// Account types the indexer fetches during a full sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    MerchantPlan,
    SubscriptionState,
    SubscriptionWallet,
    ProtocolConfig,
}

impl AccountKind {
    pub fn name(&self) -> &'static str {
        match self {
            AccountKind::MerchantPlan => "MerchantPlan",
            AccountKind::SubscriptionState => "SubscriptionState",
            AccountKind::SubscriptionWallet => "SubscriptionWallet",
            AccountKind::ProtocolConfig => "ProtocolConfig",
        }
    }

    pub fn discriminator(&self) -> Discriminator {
        account_discriminator(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MerchantPlanAccount {
    pub merchant: Address,
    pub mint: Address,
    pub plan_id: String,
    pub plan_name: String,
    pub fee_amount: u64,
    pub payment_interval: i64,
    pub is_active: bool,
    pub total_subscribers: u32,
    pub bump: u8,
}

impl MerchantPlanAccount {
    pub fn decode(data: &[u8]) -> Result<Self, LayoutError> {
        decode_prefixed(data, &AccountKind::MerchantPlan.discriminator(), "MerchantPlan")
    }

    pub fn encode(&self) -> Result<Vec<u8>, LayoutError> {
        encode_prefixed(&AccountKind::MerchantPlan.discriminator(), self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SubscriptionStateAccount {
    pub user: Address,
    pub subscription_wallet: Address,
    pub merchant: Address,
    pub mint: Address,
    pub merchant_plan: Address,
    pub fee_amount: u64,
    pub payment_interval: i64,
    pub last_payment_timestamp: i64,
    pub total_paid: u64,
    pub payment_count: u32,
    pub is_active: bool,
    pub session_token: String,
    pub bump: u8,
}

impl SubscriptionStateAccount {
    pub fn decode(data: &[u8]) -> Result<Self, LayoutError> {
        decode_prefixed(
            data,
            &AccountKind::SubscriptionState.discriminator(),
            "SubscriptionState",
        )
    }

    pub fn encode(&self) -> Result<Vec<u8>, LayoutError> {
        encode_prefixed(&AccountKind::SubscriptionState.discriminator(), self)
    }

    /// Earliest time the program accepts the next payment.
    pub fn next_due_at(&self) -> i64 {
        self.last_payment_timestamp
            .saturating_add(self.payment_interval)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SubscriptionWalletAccount {
    pub owner: Address,
    pub main_token_account: Address,
    pub mint: Address,
    pub yield_vault: Address,
    pub yield_strategy: YieldStrategy,
    pub is_yield_enabled: bool,
    pub total_subscriptions: u32,
    pub total_spent: u64,
    pub yield_shares: u64,
    pub bump: u8,
}

impl SubscriptionWalletAccount {
    pub fn decode(data: &[u8]) -> Result<Self, LayoutError> {
        decode_prefixed(
            data,
            &AccountKind::SubscriptionWallet.discriminator(),
            "SubscriptionWallet",
        )
    }

    pub fn encode(&self) -> Result<Vec<u8>, LayoutError> {
        encode_prefixed(&AccountKind::SubscriptionWallet.discriminator(), self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ProtocolConfigAccount {
    pub authority: Address,
    pub treasury: Address,
    pub protocol_fee_bps: u16,
    pub bump: u8,
}

impl ProtocolConfigAccount {
    pub fn decode(data: &[u8]) -> Result<Self, LayoutError> {
        decode_prefixed(
            data,
            &AccountKind::ProtocolConfig.discriminator(),
            "ProtocolConfig",
        )
    }

    pub fn encode(&self) -> Result<Vec<u8>, LayoutError> {
        encode_prefixed(&AccountKind::ProtocolConfig.discriminator(), self)
    }
}

/// Seeds and derivations for program-owned addresses.
pub mod pda {
    use shared_types::{Address, AddressError};

    pub fn merchant_plan(
        program_id: &Address,
        merchant: &Address,
        mint: &Address,
        plan_id: &str,
    ) -> Result<Address, AddressError> {
        Address::find_program_address(
            &[
                b"merchant_plan",
                merchant.as_bytes(),
                mint.as_bytes(),
                plan_id.as_bytes(),
            ],
            program_id,
        )
        .map(|(address, _)| address)
    }

    pub fn subscription(
        program_id: &Address,
        user: &Address,
        merchant: &Address,
        mint: &Address,
    ) -> Result<Address, AddressError> {
        Address::find_program_address(
            &[
                b"subscription",
                user.as_bytes(),
                merchant.as_bytes(),
                mint.as_bytes(),
            ],
            program_id,
        )
        .map(|(address, _)| address)
    }

    pub fn subscription_wallet(
        program_id: &Address,
        owner: &Address,
        mint: &Address,
    ) -> Result<Address, AddressError> {
        Address::find_program_address(
            &[b"subscription_wallet", owner.as_bytes(), mint.as_bytes()],
            program_id,
        )
        .map(|(address, _)| address)
    }

    pub fn protocol_config(program_id: &Address) -> Result<Address, AddressError> {
        Address::find_program_address(&[b"protocol_config"], program_id).map(|(a, _)| a)
    }

    pub fn yield_vault(program_id: &Address, mint: &Address) -> Result<Address, AddressError> {
        Address::find_program_address(&[b"yield_vault", mint.as_bytes()], program_id)
            .map(|(address, _)| address)
    }
}
