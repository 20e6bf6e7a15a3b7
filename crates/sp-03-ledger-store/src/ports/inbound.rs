//! # Inbound Ports (Driving Ports)
//!
//! Capability-scoped repositories over the projection. Each consumer takes
//! only the traits it needs: the indexer applies events, the scheduler owns
//! scheduled payments, the read services only query.
//!
//! Every mutation that consumes an on-chain event takes the event's
//! [`TransactionRecord`] and runs as one atomic store operation: the record
//! is appended in the same batch as the entity changes, and an existing
//! record with the same (signature, role, subject) key turns the whole
//! mutation into a no-op reported as [`Applied::Duplicate`].

use shared_types::{Address, Slot, TxSignature, UnixTimestamp, YieldStrategy};
use uuid::Uuid;

use crate::domain::entities::{
    Merchant, MerchantPlan, NewScheduledPayment, PaymentStatus, ScheduledPayment, Subscription,
    SubscriptionWallet, TransactionKind, TransactionRecord,
};
use crate::domain::errors::StoreResult;
use crate::domain::snapshots::{
    Applied, CancelOutcome, NewSubscription, NewWallet, PaymentApplication, PlanSnapshot,
    SubscriptionSnapshot, WalletSnapshot,
};

pub trait PlanRepository: Send + Sync {
    fn get_plan(&self, address: &Address) -> StoreResult<Option<MerchantPlan>>;

    fn plans_by_merchant(&self, merchant: &Address) -> StoreResult<Vec<MerchantPlan>>;

    fn all_plans(&self) -> StoreResult<Vec<MerchantPlan>>;

    /// Write chain state over the local plan. Revenue, listing metadata and
    /// `created_at` are kept. Returns `true` when the plan was new.
    fn upsert_plan_snapshot(&self, snapshot: &PlanSnapshot) -> StoreResult<bool>;

    /// `MerchantPlanRegistered`: upsert the plan and append its record.
    fn apply_plan_registered(
        &self,
        snapshot: &PlanSnapshot,
        record: TransactionRecord,
    ) -> StoreResult<Applied>;

    /// Set off-chain listing metadata.
    ///
    /// ## Errors
    ///
    /// - `PlanNotFound`
    fn set_plan_metadata(
        &self,
        address: &Address,
        category: Option<String>,
        description: Option<String>,
    ) -> StoreResult<MerchantPlan>;
}

pub trait WalletRepository: Send + Sync {
    fn get_wallet(&self, address: &Address) -> StoreResult<Option<SubscriptionWallet>>;

    fn wallets_by_owner(&self, owner: &Address) -> StoreResult<Vec<SubscriptionWallet>>;

    fn all_wallets(&self) -> StoreResult<Vec<SubscriptionWallet>>;

    /// Write chain state over the local wallet. Returns `true` when new.
    fn upsert_wallet_snapshot(&self, snapshot: &WalletSnapshot) -> StoreResult<bool>;

    /// `SubscriptionWalletCreated`: insert if absent, append the record.
    fn apply_wallet_created(
        &self,
        wallet: &NewWallet,
        record: TransactionRecord,
    ) -> StoreResult<Applied>;

    /// `YieldEnabled`.
    ///
    /// ## Errors
    ///
    /// - `WalletNotFound`
    /// - `YieldAlreadyEnabled`: yield is chosen once per wallet; a different
    ///   strategy is refused. When the stored wallet already runs the same
    ///   strategy (a snapshot landed first) only the record is appended. A
    ///   replay of the same event is a duplicate.
    fn apply_yield_enabled(
        &self,
        wallet: &Address,
        strategy: YieldStrategy,
        vault: Option<Address>,
        shares: u64,
        record: TransactionRecord,
    ) -> StoreResult<Applied>;
}

pub trait SubscriptionRepository: Send + Sync {
    fn get_subscription(&self, address: &Address) -> StoreResult<Option<Subscription>>;

    fn subscriptions_by_user(&self, user: &Address) -> StoreResult<Vec<Subscription>>;

    fn subscriptions_by_merchant(&self, merchant: &Address) -> StoreResult<Vec<Subscription>>;

    fn active_subscriptions(&self) -> StoreResult<Vec<Subscription>>;

    fn all_subscriptions(&self) -> StoreResult<Vec<Subscription>>;

    /// Write chain state over the local subscription. Counters from the
    /// snapshot win. A snapshot that turned inactive cancels pending
    /// payments. Returns `true` when new.
    fn upsert_subscription_snapshot(&self, snapshot: &SubscriptionSnapshot) -> StoreResult<bool>;

    /// `SubscriptionCreated`. Plan subscriber and wallet subscription
    /// counters are incremented only when the subscription is new.
    fn apply_subscription_created(
        &self,
        subscription: &NewSubscription,
        record: TransactionRecord,
    ) -> StoreResult<Applied>;

    /// `PaymentExecuted`: accumulate `total_paid`, plan revenue and wallet
    /// spend; `payment_count` and `last_payment_timestamp` never go back.
    ///
    /// ## Errors
    ///
    /// - `SubscriptionNotFound`
    /// - `AmountOverflow`
    fn apply_payment(
        &self,
        payment: &PaymentApplication,
        record: TransactionRecord,
    ) -> StoreResult<Applied>;

    /// `SubscriptionCancelled`: deactivate, release counters, cancel
    /// pending payments, all in one batch.
    ///
    /// ## Errors
    ///
    /// - `SubscriptionNotFound`
    fn apply_cancellation(
        &self,
        subscription: &Address,
        cancelled_at: UnixTimestamp,
        record: TransactionRecord,
    ) -> StoreResult<CancelOutcome>;

    /// Deactivate a subscription whose account no longer exists on chain.
    /// Counters are left to the surrounding full sync. Returns the number
    /// of pending payments cancelled, or `None` if it was already inactive.
    fn mark_subscription_closed(
        &self,
        subscription: &Address,
        closed_at: UnixTimestamp,
    ) -> StoreResult<Option<usize>>;
}

pub trait TransactionLog: Send + Sync {
    fn has_transaction(
        &self,
        signature: &str,
        kind: TransactionKind,
        subject: &Address,
    ) -> StoreResult<bool>;

    /// Append a record with no entity mutation attached (deposits,
    /// withdrawals, yield claims).
    fn append_transaction(&self, record: TransactionRecord) -> StoreResult<Applied>;

    /// Records about `subject`, newest slot first.
    fn transactions_for(
        &self,
        subject: &Address,
        limit: usize,
    ) -> StoreResult<Vec<TransactionRecord>>;

    fn all_transactions(&self) -> StoreResult<Vec<TransactionRecord>>;
}

/// Scheduled payment rows.
///
/// At most one row per subscription is open (`pending` or `processing`).
/// All status changes are compare-and-set against the row's current
/// status and fail with `InvalidTransition` otherwise.
pub trait ScheduledPaymentRepository: Send + Sync {
    /// Insert a pending row unless the subscription already has an open
    /// one. Returns the new row, or `None` when one was already open.
    fn schedule_if_absent(
        &self,
        payment: NewScheduledPayment,
    ) -> StoreResult<Option<ScheduledPayment>>;

    fn get_scheduled(&self, id: &Uuid) -> StoreResult<Option<ScheduledPayment>>;

    fn open_payment_for(&self, subscription: &Address) -> StoreResult<Option<ScheduledPayment>>;

    fn scheduled_for_subscription(
        &self,
        subscription: &Address,
    ) -> StoreResult<Vec<ScheduledPayment>>;

    fn payments_with_status(&self, status: PaymentStatus) -> StoreResult<Vec<ScheduledPayment>>;

    /// Pending rows due at `now`, earliest `scheduled_for` first.
    fn due_payments(&self, now: UnixTimestamp, limit: usize)
        -> StoreResult<Vec<ScheduledPayment>>;

    /// Claim a pending row. `None` when the row is no longer pending.
    fn mark_processing(
        &self,
        id: &Uuid,
        now: UnixTimestamp,
    ) -> StoreResult<Option<ScheduledPayment>>;

    fn mark_completed(
        &self,
        id: &Uuid,
        signature: TxSignature,
        executed_at: UnixTimestamp,
    ) -> StoreResult<ScheduledPayment>;

    /// Terminal failure that is not retried and not counted as an attempt.
    fn fail_payment(&self, id: &Uuid, error: &str) -> StoreResult<ScheduledPayment>;

    /// Count a failed attempt. With `retry_at` the row returns to pending
    /// at that time, without it the row is terminally failed.
    fn record_failure(
        &self,
        id: &Uuid,
        error: &str,
        retry_at: Option<UnixTimestamp>,
    ) -> StoreResult<ScheduledPayment>;

    /// Rows in `processing` whose claim started before `started_before`.
    fn stuck_processing(&self, started_before: UnixTimestamp)
        -> StoreResult<Vec<ScheduledPayment>>;

    /// Flip every pending row of `subscription` to cancelled.
    fn cancel_pending_for(&self, subscription: &Address) -> StoreResult<usize>;

    /// Delete completed rows executed before `before`.
    fn purge_completed(&self, before: UnixTimestamp) -> StoreResult<usize>;
}

pub trait MerchantRepository: Send + Sync {
    fn get_merchant(&self, wallet: &Address) -> StoreResult<Option<Merchant>>;

    fn save_merchant(&self, merchant: &Merchant) -> StoreResult<()>;

    /// Insert `merchant` unless one exists for its wallet. Returns the
    /// stored record either way.
    fn insert_merchant_if_absent(&self, merchant: Merchant) -> StoreResult<Merchant>;
}

pub trait CheckpointRepository: Send + Sync {
    fn last_processed_slot(&self) -> StoreResult<Option<Slot>>;

    /// Persist `slot` if it is ahead of the stored checkpoint. Returns the
    /// checkpoint after the call.
    fn advance_checkpoint(&self, slot: Slot) -> StoreResult<Slot>;
}

/// Every repository at once, for wiring a single backing store.
pub trait LedgerRepository:
    PlanRepository
    + WalletRepository
    + SubscriptionRepository
    + TransactionLog
    + ScheduledPaymentRepository
    + MerchantRepository
    + CheckpointRepository
{
}

impl<T> LedgerRepository for T where
    T: PlanRepository
        + WalletRepository
        + SubscriptionRepository
        + TransactionLog
        + ScheduledPaymentRepository
        + MerchantRepository
        + CheckpointRepository
{
}
