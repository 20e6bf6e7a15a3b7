//! Inputs to store mutations: authoritative account snapshots read from
//! chain during a full sync, and the resolved fields of creation events.

use shared_types::{Address, TokenAmount, UnixTimestamp, YieldStrategy};

/// Merchant plan account state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSnapshot {
    pub address: Address,
    pub merchant: Address,
    pub mint: Address,
    pub plan_id: String,
    pub plan_name: String,
    pub fee_amount: u64,
    pub payment_interval: i64,
    pub is_active: bool,
    pub total_subscribers: u32,
}

/// Subscription wallet account state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub address: Address,
    pub owner: Address,
    pub mint: Address,
    pub main_token_account: Address,
    pub is_yield_enabled: bool,
    pub yield_strategy: YieldStrategy,
    /// `None` while yield is disabled.
    pub yield_vault: Option<Address>,
    pub yield_shares: u64,
    pub total_subscriptions: u32,
    pub total_spent: u64,
}

/// Subscription state account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub address: Address,
    pub user: Address,
    pub subscription_wallet: Address,
    pub merchant: Address,
    pub merchant_plan: Address,
    pub mint: Address,
    pub fee_amount: u64,
    pub payment_interval: i64,
    pub last_payment_timestamp: UnixTimestamp,
    pub total_paid: u64,
    pub payment_count: u32,
    pub is_active: bool,
    pub session_token: String,
}

/// A wallet announced by `SubscriptionWalletCreated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWallet {
    pub address: Address,
    pub owner: Address,
    pub mint: Address,
    pub main_token_account: Option<Address>,
}

/// A subscription announced by `SubscriptionCreated`, with fee and interval
/// already resolved from the subscription account or its plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
    pub address: Address,
    pub user: Address,
    pub subscription_wallet: Address,
    pub merchant: Address,
    pub merchant_plan: Address,
    pub plan_id: String,
    pub mint: Address,
    pub fee_amount: TokenAmount,
    pub payment_interval: i64,
    pub last_payment_timestamp: UnixTimestamp,
    pub session_token: String,
}

/// A `PaymentExecuted` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentApplication {
    pub subscription: Address,
    pub amount: TokenAmount,
    pub payment_number: u32,
    /// Block time of the payment, when known.
    pub paid_at: Option<UnixTimestamp>,
}

/// Profile fields a merchant can set. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MerchantProfile {
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub logo_url: Option<String>,
    pub webhook_url: Option<String>,
}

/// Result of an idempotent mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The mutation was applied and its transaction record appended.
    Fresh,
    /// The (signature, role) record already existed; nothing changed.
    Duplicate,
}

impl Applied {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Applied::Fresh)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Applied::Fresh => "applied",
            Applied::Duplicate => "duplicate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelOutcome {
    pub applied: Applied,
    /// Pending scheduled payments flipped to cancelled.
    pub cancelled_payments: usize,
}
