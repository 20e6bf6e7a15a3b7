//! Summaries returned by the indexer's batch operations.

use shared_types::Slot;

/// Result of processing one transaction's logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxOutcome {
    pub applied: usize,
    pub duplicates: usize,
    pub dropped: usize,
    pub failed: usize,
}

impl TxOutcome {
    pub fn merge(&mut self, other: TxOutcome) {
        self.applied += other.applied;
        self.duplicates += other.duplicates;
        self.dropped += other.dropped;
        self.failed += other.failed;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Signatures newer than the checkpoint.
    pub signatures: usize,
    /// Transactions fetched and dispatched.
    pub transactions: usize,
    /// Transactions skipped because they failed on chain or could not be
    /// fetched.
    pub skipped: usize,
    pub events: TxOutcome,
    pub checkpoint: Option<Slot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub plans: usize,
    pub wallets: usize,
    pub subscriptions: usize,
    /// Local subscriptions whose account no longer exists.
    pub closed: usize,
    /// Active subscriptions that received a missing scheduled payment.
    pub scheduled: usize,
    /// Accounts that failed to decode or upsert.
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another sync held the guard.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub tip: Slot,
    pub resumed_from: Option<Slot>,
    pub backfill: BackfillReport,
    pub sync: SyncOutcome,
}
