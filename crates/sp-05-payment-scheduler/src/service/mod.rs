//! # Payment Scheduler Service
//!
//! Owns the scheduled-payment rows. Three periodic jobs, each behind its
//! own single-flight guard:
//!
//! - **sweep**: execute due `pending` rows, sequentially
//! - **reaper**: resolve rows stuck in `processing`
//! - **purge**: drop old `completed` rows
//!
//! The sweep and the maintenance job (reaper then purge) run as separate
//! tasks; see [`PaymentScheduler::run_sweep_loop`] and
//! [`PaymentScheduler::run_maintenance_loop`].

mod execute;
mod maintenance;

use shared_types::{Address, SingleFlight, TimeSource, UnixTimestamp};
use sp_01_chain_gateway::ChainGateway;
use sp_03_ledger_store::{LedgerRepository, NewScheduledPayment, ScheduledPayment, Subscription};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::SchedulerConfig;
use crate::domain::errors::SchedulerResult;
use crate::domain::outcome::{SweepOutcome, SweepReport};
use crate::ports::outbound::PaymentNotifier;

pub struct PaymentScheduler<G: ChainGateway, S: LedgerRepository> {
    gateway: Arc<G>,
    store: Arc<S>,
    notifier: Arc<dyn PaymentNotifier>,
    time: Arc<dyn TimeSource>,
    config: SchedulerConfig,
    sweep_guard: SingleFlight,
    maintenance_guard: SingleFlight,
}

impl<G: ChainGateway, S: LedgerRepository> PaymentScheduler<G, S> {
    pub fn new(
        config: SchedulerConfig,
        gateway: Arc<G>,
        store: Arc<S>,
        notifier: Arc<dyn PaymentNotifier>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            gateway,
            store,
            notifier,
            time,
            config,
            sweep_guard: SingleFlight::new(),
            maintenance_guard: SingleFlight::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Queue the next cycle of `subscription` at
    /// `last_payment_timestamp + payment_interval`.
    ///
    /// Returns `None` when the subscription is inactive or already has an
    /// open row; the check and insert are one store operation.
    pub fn schedule_next_payment(
        &self,
        subscription: &Subscription,
    ) -> SchedulerResult<Option<ScheduledPayment>> {
        if !subscription.is_active {
            return Ok(None);
        }
        let scheduled = self.store.schedule_if_absent(NewScheduledPayment {
            subscription: subscription.address,
            merchant: subscription.merchant,
            amount: subscription.fee_amount,
            scheduled_for: subscription.next_payment_at(),
        })?;
        match &scheduled {
            Some(row) => info!(
                "[sp-05] Scheduled payment {} for {} at {}",
                row.id, row.subscription, row.scheduled_for
            ),
            None => debug!(
                "[sp-05] {} already has an open payment",
                subscription.address
            ),
        }
        Ok(scheduled)
    }

    /// Cancel every pending row of `subscription`. Rows already processing
    /// are left to finish.
    pub fn cancel_scheduled_payments(&self, subscription: &Address) -> SchedulerResult<usize> {
        let cancelled = self.store.cancel_pending_for(subscription)?;
        info!(
            "[sp-05] Cancelled {} scheduled payments for {}",
            cancelled, subscription
        );
        Ok(cancelled)
    }

    /// Execute up to `batch_size` due rows, earliest first, one at a time.
    /// Returns [`SweepOutcome::Skipped`] when a sweep is already running.
    pub async fn sweep(&self) -> SchedulerResult<SweepOutcome> {
        let Some(_permit) = self.sweep_guard.try_acquire() else {
            debug!("[sp-05] Sweep already running, skipping");
            return Ok(SweepOutcome::Skipped);
        };

        let due = self
            .store
            .due_payments(self.now(), self.config.batch_size)?;
        let mut report = SweepReport {
            due: due.len(),
            ..Default::default()
        };
        if due.is_empty() {
            return Ok(SweepOutcome::Completed(report));
        }
        info!("[sp-05] Processing {} due payments", due.len());

        for (i, payment) in due.iter().enumerate() {
            if i > 0 && !self.config.payment_delay.is_zero() {
                tokio::time::sleep(self.config.payment_delay).await;
            }
            match self.execute_payment(payment).await {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    error!("[sp-05] Payment {} aborted: {}", payment.id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "[sp-05] Sweep done: {} completed, {} retrying, {} failed, {} skipped",
            report.completed, report.retrying, report.failed, report.skipped
        );
        Ok(SweepOutcome::Completed(report))
    }

    pub async fn run_sweep_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("[sp-05] Sweep loop shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        error!("[sp-05] Sweep failed: {}", e);
                    }
                }
            }
        }
    }

    pub async fn run_maintenance_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.maintenance_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("[sp-05] Maintenance loop shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_maintenance().await {
                        error!("[sp-05] Maintenance failed: {}", e);
                    }
                }
            }
        }
    }

    fn now(&self) -> UnixTimestamp {
        self.time.now()
    }
}
