//! Results of scheduler runs and the payloads handed to the notifier.

use shared_types::{TokenAmount, TxSignature, UnixTimestamp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Completed { signature: TxSignature },
    /// Back to pending, to be retried at `retry_at`.
    Retrying { retry_at: UnixTimestamp, attempts: u32 },
    Failed { reason: String },
    /// The row was no longer pending when claimed.
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub due: usize,
    pub completed: usize,
    pub retrying: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SweepReport {
    pub fn record(&mut self, outcome: &PaymentOutcome) {
        match outcome {
            PaymentOutcome::Completed { .. } => self.completed += 1,
            PaymentOutcome::Retrying { .. } => self.retrying += 1,
            PaymentOutcome::Failed { .. } => self.failed += 1,
            PaymentOutcome::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed(SweepReport),
    /// Another sweep held the guard.
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Stuck rows whose payment turned out to have landed.
    pub reaped_completed: usize,
    /// Stuck rows sent down the failure path.
    pub reaped_failed: usize,
    pub purged: usize,
}

/// Payload of a payment-succeeded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSucceeded {
    pub amount: TokenAmount,
    pub payment_number: u32,
    pub signature: TxSignature,
}

/// Payload of a payment-failed notification, sent once per exhausted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFailed {
    pub amount_required: TokenAmount,
    pub balance_available: TokenAmount,
    pub failure_count: u32,
    pub error: String,
}
