//! # Projection Entities
//!
//! Off-chain mirror of program state plus the scheduler's work items.
//! Monetary fields are [`TokenAmount`]s so accumulation never loses
//! precision; on-chain values arrive as `u64` and widen on the way in.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Slot, TokenAmount, TxSignature, UnixTimestamp, YieldStrategy};
use uuid::Uuid;

/// Seconds in the 30-day month used to normalize recurring revenue.
pub const SECONDS_PER_MONTH: i64 = 2_592_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantPlan {
    pub address: Address,
    pub merchant: Address,
    pub mint: Address,
    pub plan_id: String,
    pub plan_name: String,
    pub fee_amount: TokenAmount,
    pub payment_interval: i64,
    pub is_active: bool,
    pub total_subscribers: u32,
    /// Only ever grows, one idempotent payment at a time. Not on chain.
    pub total_revenue: TokenAmount,
    /// Off-chain listing metadata.
    pub category: Option<String>,
    pub description: Option<String>,
    pub created_at: UnixTimestamp,
    pub updated_at: UnixTimestamp,
}

impl MerchantPlan {
    /// Fee normalized to a 30-day month (integer division).
    pub fn monthly_fee(&self) -> TokenAmount {
        monthly_amount(self.fee_amount, self.payment_interval)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionWallet {
    pub address: Address,
    pub owner: Address,
    pub mint: Address,
    pub main_token_account: Option<Address>,
    pub is_yield_enabled: bool,
    pub yield_strategy: YieldStrategy,
    pub yield_vault: Option<Address>,
    pub yield_shares: u64,
    pub total_subscriptions: u32,
    pub total_spent: TokenAmount,
    pub created_at: UnixTimestamp,
    pub updated_at: UnixTimestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
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
    pub total_paid: TokenAmount,
    pub payment_count: u32,
    pub is_active: bool,
    pub session_token: String,
    pub created_at: UnixTimestamp,
    pub cancelled_at: Option<UnixTimestamp>,
    pub updated_at: UnixTimestamp,
}

impl Subscription {
    pub fn next_payment_at(&self) -> UnixTimestamp {
        self.last_payment_timestamp
            .saturating_add(self.payment_interval)
    }

    pub fn monthly_fee(&self) -> TokenAmount {
        monthly_amount(self.fee_amount, self.payment_interval)
    }
}

fn monthly_amount(fee: TokenAmount, interval: i64) -> TokenAmount {
    if interval <= 0 {
        return TokenAmount::zero();
    }
    fee.checked_mul_u64(SECONDS_PER_MONTH as u64)
        .and_then(|scaled| scaled.checked_div_u64(interval as u64))
        .unwrap_or_default()
}

/// Role a transaction played for one entity. Together with the signature
/// and subject address it identifies a [`TransactionRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    SubscriptionCreated,
    Payment,
    Cancel,
    WalletCreated,
    YieldEnabled,
    YieldClaimed,
    PlanRegistered,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::SubscriptionCreated => "subscription_created",
            TransactionKind::Payment => "payment",
            TransactionKind::Cancel => "cancel",
            TransactionKind::WalletCreated => "wallet_created",
            TransactionKind::YieldEnabled => "yield_enabled",
            TransactionKind::YieldClaimed => "yield_claimed",
            TransactionKind::PlanRegistered => "plan_registered",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Success,
    Failed,
}

/// Append-only audit record. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub signature: TxSignature,
    pub kind: TransactionKind,
    /// Subscription, wallet or plan the record is about.
    pub subject: Address,
    pub amount: TokenAmount,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub slot: Slot,
    pub block_time: Option<UnixTimestamp>,
    pub status: TransactionStatus,
}

impl TransactionRecord {
    pub fn new(
        signature: impl Into<TxSignature>,
        kind: TransactionKind,
        subject: Address,
        slot: Slot,
    ) -> Self {
        Self {
            signature: signature.into(),
            kind,
            subject,
            amount: TokenAmount::zero(),
            from: None,
            to: None,
            slot,
            block_time: None,
            status: TransactionStatus::Success,
        }
    }

    pub fn with_amount(mut self, amount: TokenAmount) -> Self {
        self.amount = amount;
        self
    }

    pub fn between(mut self, from: Address, to: Address) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn at(mut self, block_time: Option<UnixTimestamp>) -> Self {
        self.block_time = block_time;
        self
    }
}

/// Scheduled payment lifecycle.
///
/// ```text
/// pending ──► processing ──► completed
///    │            │
///    │            ├──► failed
///    │            └──► pending (retry)
///    └──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Pending)
        )
    }

    /// Pending and processing rows count against the one-open-row limit.
    pub fn is_open(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub id: Uuid,
    pub subscription: Address,
    pub merchant: Address,
    pub amount: TokenAmount,
    pub scheduled_for: UnixTimestamp,
    pub status: PaymentStatus,
    pub retry_count: u32,
    pub error_message: Option<String>,
    pub signature: Option<TxSignature>,
    pub executed_at: Option<UnixTimestamp>,
    pub processing_started_at: Option<UnixTimestamp>,
    pub created_at: UnixTimestamp,
    pub updated_at: UnixTimestamp,
}

/// Input for a new pending row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScheduledPayment {
    pub subscription: Address,
    pub merchant: Address,
    pub amount: TokenAmount,
    pub scheduled_for: UnixTimestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub wallet: Address,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub logo_url: Option<String>,
    pub webhook_url: Option<String>,
    /// Hex HMAC key for webhook signatures.
    pub webhook_secret: String,
    pub created_at: UnixTimestamp,
    pub updated_at: UnixTimestamp,
}
