//! Reaping stuck rows and purging old ones.

use shared_types::TxSignature;
use sp_01_chain_gateway::{ChainGateway, GatewayResult, SubscriptionStateAccount};
use sp_03_ledger_store::{LedgerRepository, NewScheduledPayment, ScheduledPayment};
use sp_telemetry::STUCK_PAYMENTS_REAPED;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::PaymentScheduler;
use crate::domain::errors::{PaymentFailure, SchedulerResult};
use crate::domain::outcome::{MaintenanceReport, PaymentOutcome};

/// Recent signatures inspected when looking for a landed payment.
const LANDED_LOOKBACK: usize = 10;

/// A payment found on chain for a stuck row.
struct LandedPayment {
    signature: TxSignature,
    state: SubscriptionStateAccount,
}

fn secs(duration: std::time::Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

impl<G: ChainGateway, S: LedgerRepository> PaymentScheduler<G, S> {
    /// Reap stuck rows, then purge old completed rows. Skipped when a
    /// maintenance run is already in flight.
    pub async fn run_maintenance(&self) -> SchedulerResult<MaintenanceReport> {
        let Some(_permit) = self.maintenance_guard.try_acquire() else {
            debug!("[sp-05] Maintenance already running, skipping");
            return Ok(MaintenanceReport::default());
        };

        let mut report = self.reap_stuck_payments().await?;
        report.purged = self.purge_completed()?;
        Ok(report)
    }

    /// Resolve rows left in `processing` longer than the timeout, e.g. by a
    /// crash between submission and bookkeeping.
    ///
    /// If the subscription account shows a payment at or after the row's
    /// due time, the row is completed and the next cycle queued. Otherwise
    /// the row goes through the normal failure path. Rows whose chain state
    /// cannot be read are left for the next run.
    pub async fn reap_stuck_payments(&self) -> SchedulerResult<MaintenanceReport> {
        let now = self.now();
        let cutoff = now.saturating_sub(secs(self.config.processing_timeout));
        let mut report = MaintenanceReport::default();

        for row in self.store.stuck_processing(cutoff)? {
            let landed = match self.find_landed_payment(&row).await {
                Ok(landed) => landed,
                Err(e) => {
                    warn!(
                        "[sp-05] Cannot check stuck payment {} on chain: {}",
                        row.id, e
                    );
                    continue;
                }
            };
            STUCK_PAYMENTS_REAPED.inc();

            match landed {
                Some(landed) => {
                    info!(
                        signature = %landed.signature,
                        "[sp-05] Stuck payment {} had landed, completing",
                        row.id
                    );
                    self.store
                        .mark_completed(&row.id, landed.signature, now)?;
                    if landed.state.is_active {
                        self.store.schedule_if_absent(NewScheduledPayment {
                            subscription: row.subscription,
                            merchant: row.merchant,
                            amount: row.amount,
                            scheduled_for: landed.state.next_due_at(),
                        })?;
                    }
                    report.reaped_completed += 1;
                }
                None => {
                    let since = row.processing_started_at.unwrap_or(row.updated_at);
                    let subscription = self.store.get_subscription(&row.subscription)?;
                    let outcome = self
                        .fail(
                            &row,
                            subscription.as_ref(),
                            PaymentFailure::Stuck { since },
                            Instant::now(),
                        )
                        .await?;
                    debug!("[sp-05] Stuck payment {} reaped: {:?}", row.id, outcome);
                    if !matches!(outcome, PaymentOutcome::Skipped) {
                        report.reaped_failed += 1;
                    }
                }
            }
        }

        if report.reaped_completed + report.reaped_failed > 0 {
            info!(
                "[sp-05] Reaped stuck payments: {} completed, {} failed",
                report.reaped_completed, report.reaped_failed
            );
        }
        Ok(report)
    }

    async fn find_landed_payment(
        &self,
        row: &ScheduledPayment,
    ) -> GatewayResult<Option<LandedPayment>> {
        let Some(account) = self.gateway.get_account(&row.subscription).await? else {
            return Ok(None);
        };
        let state = SubscriptionStateAccount::decode(&account.data)?;
        if state.last_payment_timestamp < row.scheduled_for {
            return Ok(None);
        }

        let signature = self
            .gateway
            .get_signatures_for_address(&row.subscription, None, LANDED_LOOKBACK)
            .await?
            .into_iter()
            .find(|info| !info.failed)
            .map(|info| info.signature)
            .unwrap_or_default();
        Ok(Some(LandedPayment { signature, state }))
    }

    /// Delete completed rows older than the retention window.
    pub fn purge_completed(&self) -> SchedulerResult<usize> {
        let before = self
            .now()
            .saturating_sub(secs(self.config.completed_retention));
        let purged = self.store.purge_completed(before)?;
        if purged > 0 {
            info!("[sp-05] Purged {} completed payments", purged);
        }
        Ok(purged)
    }
}
