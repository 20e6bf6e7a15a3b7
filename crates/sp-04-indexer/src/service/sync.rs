//! Full account sync.
//!
//! Reads every plan, wallet and subscription account owned by the program
//! and writes them over the projection. Account state is authoritative for
//! counters; revenue is not on chain and is never touched here.

use std::collections::HashSet;

use shared_types::Address;
use sp_01_chain_gateway::{AccountKind, AccountSnapshot, ChainGateway};
use sp_03_ledger_store::LedgerRepository;
use sp_telemetry::FULL_SYNC_RUNS;
use tracing::{debug, info, warn};

use super::IndexerService;
use crate::domain::errors::{IndexerError, IndexerResult};
use crate::domain::mapping::{decode_plan, decode_subscription, decode_wallet};
use crate::domain::report::{SyncOutcome, SyncReport};

impl<G: ChainGateway, S: LedgerRepository> IndexerService<G, S> {
    /// Run one full sync unless another is in flight, in which case it
    /// returns [`SyncOutcome::Skipped`] immediately.
    ///
    /// A failing account is logged and counted; a failing RPC call aborts
    /// this run only.
    pub async fn full_sync(&self) -> IndexerResult<SyncOutcome> {
        let Some(_permit) = self.sync_guard.try_acquire() else {
            info!("[sp-04] Full sync already running, skipping");
            FULL_SYNC_RUNS.with_label_values(&["skipped"]).inc();
            return Ok(SyncOutcome::Skipped);
        };

        match self.sync_accounts().await {
            Ok(report) => {
                FULL_SYNC_RUNS.with_label_values(&["completed"]).inc();
                info!(
                    "[sp-04] Full sync: {} plans, {} wallets, {} subscriptions, {} closed, {} scheduled, {} failed",
                    report.plans,
                    report.wallets,
                    report.subscriptions,
                    report.closed,
                    report.scheduled,
                    report.failed
                );
                Ok(SyncOutcome::Completed(report))
            }
            Err(e) => {
                FULL_SYNC_RUNS.with_label_values(&["failed"]).inc();
                Err(e)
            }
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.sync_guard.is_busy()
    }

    async fn sync_accounts(&self) -> IndexerResult<SyncReport> {
        let mut report = SyncReport::default();

        // Plans and wallets first so subscription counters land on rows
        // that exist.
        for account in self.program_accounts(AccountKind::MerchantPlan).await? {
            match decode_plan(&account)
                .and_then(|s| self.store.upsert_plan_snapshot(&s).map_err(Into::into))
            {
                Ok(_) => report.plans += 1,
                Err(e) => self.sync_failure(&mut report, &account.address, e),
            }
        }

        for account in self.program_accounts(AccountKind::SubscriptionWallet).await? {
            match decode_wallet(&account)
                .and_then(|s| self.store.upsert_wallet_snapshot(&s).map_err(Into::into))
            {
                Ok(_) => report.wallets += 1,
                Err(e) => self.sync_failure(&mut report, &account.address, e),
            }
        }

        let mut on_chain: HashSet<Address> = HashSet::new();
        for account in self.program_accounts(AccountKind::SubscriptionState).await? {
            on_chain.insert(account.address);
            match decode_subscription(&account)
                .and_then(|s| self.store.upsert_subscription_snapshot(&s).map_err(Into::into))
            {
                Ok(_) => report.subscriptions += 1,
                Err(e) => self.sync_failure(&mut report, &account.address, e),
            }
        }

        // Cancelled subscriptions close their account. Anything still active
        // locally but gone on chain missed its cancellation event. A scan can
        // lag behind the node, so absence is confirmed by a direct read.
        let now = self.now();
        for subscription in self.store.active_subscriptions()? {
            if on_chain.contains(&subscription.address) {
                continue;
            }
            match self.gateway.get_account(&subscription.address).await {
                Ok(None) => {}
                Ok(Some(_)) => {
                    debug!(
                        "[sp-04] Subscription {} missing from scan but still on chain, kept",
                        subscription.address
                    );
                    continue;
                }
                Err(e) => {
                    self.sync_failure(&mut report, &subscription.address, e.into());
                    continue;
                }
            }
            if let Some(cancelled) = self
                .store
                .mark_subscription_closed(&subscription.address, now)?
            {
                warn!(
                    "[sp-04] Subscription {} no longer exists on chain, closed ({} pending payments cancelled)",
                    subscription.address, cancelled
                );
                report.closed += 1;
            }
        }

        for subscription in self.store.active_subscriptions()? {
            match self.scheduling.ensure_scheduled(&subscription).await {
                Ok(true) => report.scheduled += 1,
                Ok(false) => {}
                Err(e) => self.sync_failure(&mut report, &subscription.address, e),
            }
        }

        Ok(report)
    }

    async fn program_accounts(&self, kind: AccountKind) -> IndexerResult<Vec<AccountSnapshot>> {
        Ok(self
            .gateway
            .get_program_accounts(&self.config.program_id, kind)
            .await?)
    }

    fn sync_failure(
        &self,
        report: &mut SyncReport,
        address: &Address,
        error: IndexerError,
    ) {
        warn!("[sp-04] Full sync skipped {}: {}", address, error);
        report.failed += 1;
    }
}
