//! # Indexer Service
//!
//! Startup (in order):
//!
//! 1. Probe the cluster with `getSlot`, then require the program account to
//!    exist and be executable. Failure is fatal.
//! 2. Resume from the stored checkpoint, or start at the current tip.
//! 3. Backfill signatures newer than the checkpoint, oldest first.
//! 4. Run a full account sync.
//!
//! After startup [`IndexerService::run_live`] follows the log subscription
//! and [`IndexerService::run_full_sync_loop`] re-syncs periodically. Both
//! take `&self` and are meant to run as separate tasks on an `Arc`.

mod dispatch;
mod sync;

use shared_types::{SingleFlight, Slot, TimeSource, UnixTimestamp};
use sp_01_chain_gateway::{ChainGateway, LogNotification, SignatureInfo};
use sp_02_event_parser::EventParser;
use sp_03_ledger_store::LedgerRepository;
use sp_telemetry::{EVENTS_DROPPED, LAST_PROCESSED_SLOT};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::IndexerConfig;
use crate::domain::errors::{IndexerError, IndexerResult};
use crate::domain::report::{BackfillReport, StartupReport, SyncOutcome, TxOutcome};
use crate::ports::outbound::{LifecycleNotifier, PaymentScheduling};

/// Where a transaction came from. Live notifications carry no block time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    pub signature: String,
    pub slot: Slot,
    pub block_time: Option<UnixTimestamp>,
}

pub struct IndexerService<G: ChainGateway, S: LedgerRepository> {
    gateway: Arc<G>,
    store: Arc<S>,
    notifier: Arc<dyn LifecycleNotifier>,
    scheduling: Arc<dyn PaymentScheduling>,
    time: Arc<dyn TimeSource>,
    parser: EventParser,
    config: IndexerConfig,
    sync_guard: SingleFlight,
}

impl<G: ChainGateway, S: LedgerRepository> IndexerService<G, S> {
    pub fn new(
        config: IndexerConfig,
        gateway: Arc<G>,
        store: Arc<S>,
        notifier: Arc<dyn LifecycleNotifier>,
        scheduling: Arc<dyn PaymentScheduling>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            parser: EventParser::new(&config.program_id),
            gateway,
            store,
            notifier,
            scheduling,
            time,
            config,
            sync_guard: SingleFlight::new(),
        }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Run the startup sequence. Connectivity and program checks are fatal;
    /// a failed backfill or full sync is logged and startup carries on.
    pub async fn start(&self) -> IndexerResult<StartupReport> {
        let tip = self.verify_program().await?;

        let resumed_from = self.store.last_processed_slot()?;
        let backfill = match resumed_from {
            Some(checkpoint) => {
                info!(
                    "[sp-04] Resuming from checkpoint slot {} (tip {})",
                    checkpoint, tip
                );
                match self.backfill().await {
                    Ok(report) => report,
                    Err(e) => {
                        error!("[sp-04] Backfill from slot {} failed: {}", checkpoint, e);
                        BackfillReport {
                            checkpoint: Some(checkpoint),
                            ..Default::default()
                        }
                    }
                }
            }
            None => {
                info!("[sp-04] No checkpoint, starting at tip slot {}", tip);
                self.advance_checkpoint(tip)?;
                BackfillReport {
                    checkpoint: Some(tip),
                    ..Default::default()
                }
            }
        };

        let sync = match self.full_sync().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("[sp-04] Initial full sync failed: {}", e);
                SyncOutcome::Skipped
            }
        };

        Ok(StartupReport {
            tip,
            resumed_from,
            backfill,
            sync,
        })
    }

    /// Check connectivity and the program account. Returns the current slot.
    pub async fn verify_program(&self) -> IndexerResult<Slot> {
        let program_id = self.config.program_id;
        let tip = self.gateway.get_slot().await?;
        let account = self
            .gateway
            .get_account(&program_id)
            .await?
            .ok_or(IndexerError::ProgramNotFound(program_id))?;
        if !account.executable {
            return Err(IndexerError::ProgramNotExecutable(program_id));
        }
        info!(
            "[sp-04] Connected at slot {}, program {} is deployed",
            tip, program_id
        );
        Ok(tip)
    }

    /// Replay every program transaction newer than the checkpoint.
    ///
    /// Pages back from the newest signature until a page reaches a slot
    /// older than the checkpoint. Transactions in the checkpoint slot
    /// itself are replayed; duplicates are no-ops. Each transaction is
    /// applied oldest first and advances the checkpoint after it.
    pub async fn backfill(&self) -> IndexerResult<BackfillReport> {
        let program_id = self.config.program_id;
        let checkpoint = self.store.last_processed_slot()?.unwrap_or(0);
        let page_size = self.config.backfill_page_size;

        let mut newer: Vec<SignatureInfo> = Vec::new();
        let mut before: Option<String> = None;
        loop {
            let page = self
                .gateway
                .get_signatures_for_address(&program_id, before.as_deref(), page_size)
                .await?;
            let page_len = page.len();
            let last = page.last().map(|info| info.signature.clone());

            let mut reached_checkpoint = false;
            for info in page {
                if info.slot < checkpoint {
                    reached_checkpoint = true;
                    break;
                }
                newer.push(info);
            }

            if reached_checkpoint || page_len < page_size || last.is_none() {
                break;
            }
            before = last;
        }

        let mut report = BackfillReport {
            signatures: newer.len(),
            ..Default::default()
        };
        if newer.is_empty() {
            report.checkpoint = Some(checkpoint);
            return Ok(report);
        }
        info!(
            "[sp-04] Backfilling {} signatures since slot {}",
            newer.len(),
            checkpoint
        );

        for info in newer.into_iter().rev() {
            if info.failed {
                report.skipped += 1;
                self.advance_checkpoint(info.slot)?;
                continue;
            }

            match self.gateway.get_transaction(&info.signature).await {
                Ok(Some(tx)) => {
                    let ctx = TxContext {
                        signature: tx.signature,
                        slot: tx.slot,
                        block_time: tx.block_time.or(info.block_time),
                    };
                    if tx.failed {
                        report.skipped += 1;
                    } else {
                        report.transactions += 1;
                        report.events.merge(self.process_logs(&ctx, &tx.log_messages).await);
                    }
                }
                Ok(None) => {
                    warn!(
                        "[sp-04] Transaction {} not available, skipping",
                        info.signature
                    );
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(
                        "[sp-04] Failed to fetch transaction {}: {}",
                        info.signature, e
                    );
                    report.skipped += 1;
                }
            }
            report.checkpoint = Some(self.advance_checkpoint(info.slot)?);
        }

        info!(
            "[sp-04] Backfill done: {} transactions, {} events applied, {} duplicates, {} skipped",
            report.transactions, report.events.applied, report.events.duplicates, report.skipped
        );
        Ok(report)
    }

    /// Parse one transaction's logs and dispatch every event in log order.
    /// A failing event is logged and does not stop the others.
    pub async fn process_logs<L: AsRef<str> + Sync>(&self, ctx: &TxContext, logs: &[L]) -> TxOutcome {
        let parsed = self.parser.parse_logs(logs);
        let mut outcome = TxOutcome::default();

        for malformed in &parsed.malformed {
            warn!(
                signature = %ctx.signature,
                "[sp-04] Dropping malformed event: {}", malformed
            );
            EVENTS_DROPPED.inc();
            outcome.dropped += 1;
        }

        for event in parsed.events {
            match self.dispatch(&event, ctx).await {
                Ok(Some(applied)) if applied.is_fresh() => outcome.applied += 1,
                Ok(Some(_)) => outcome.duplicates += 1,
                Ok(None) => outcome.dropped += 1,
                Err(e) => {
                    error!(
                        signature = %ctx.signature,
                        slot = ctx.slot,
                        "[sp-04] Failed to apply {}: {}", event.name(), e
                    );
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }

    /// Handle one live notification and advance the checkpoint past it.
    pub async fn handle_notification(&self, notification: LogNotification) -> TxOutcome {
        let ctx = TxContext {
            signature: notification.signature,
            slot: notification.slot,
            block_time: None,
        };
        let outcome = if notification.failed {
            debug!("[sp-04] Ignoring failed transaction {}", ctx.signature);
            TxOutcome::default()
        } else {
            self.process_logs(&ctx, &notification.logs).await
        };

        if let Err(e) = self.advance_checkpoint(ctx.slot) {
            error!("[sp-04] Failed to persist checkpoint {}: {}", ctx.slot, e);
        }
        outcome
    }

    /// Follow the live log subscription until shutdown.
    ///
    /// After each (re)subscription a catch-up backfill covers transactions
    /// that landed while no subscription was open. When the stream ends the
    /// subscription is re-established after `resubscribe_delay`.
    pub async fn run_live(&self, mut shutdown: watch::Receiver<bool>) -> IndexerResult<()> {
        let program_id = self.config.program_id;
        loop {
            let mut stream = self.gateway.subscribe_logs(&program_id).await?;
            info!("[sp-04] Live log subscription open for {}", program_id);

            if let Err(e) = self.backfill().await {
                warn!("[sp-04] Catch-up backfill failed: {}", e);
            }

            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        info!("[sp-04] Live listener shutting down");
                        return Ok(());
                    }
                    next = stream.recv() => match next {
                        Some(notification) => {
                            self.handle_notification(notification).await;
                        }
                        None => {
                            warn!("[sp-04] Log stream ended, re-subscribing");
                            break;
                        }
                    }
                }
            }

            tokio::select! {
                _ = shutdown.changed() => return Ok(()),
                _ = tokio::time::sleep(self.config.resubscribe_delay) => {}
            }
        }
    }

    /// Periodic full sync until shutdown. The first run happens one full
    /// interval after the call, startup has already synced.
    pub async fn run_full_sync_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.full_sync_interval;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    info!("[sp-04] Full sync loop shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.full_sync().await {
                        error!("[sp-04] Full sync failed: {}", e);
                    }
                }
            }
        }
    }

    fn advance_checkpoint(&self, slot: Slot) -> IndexerResult<Slot> {
        let stored = self.store.advance_checkpoint(slot)?;
        LAST_PROCESSED_SLOT.set(stored as f64);
        Ok(stored)
    }

    fn now(&self) -> UnixTimestamp {
        self.time.now()
    }
}
