//! Per-event handlers. Every handler builds the event's transaction record
//! and hands it to one atomic store mutation.

use shared_types::{Address, TokenAmount, YieldStrategy};
use sp_01_chain_gateway::{ChainGateway, SubscriptionStateAccount, SubscriptionWalletAccount};
use sp_02_event_parser::{
    MerchantPlanRegistered, PaymentExecuted, ProgramEvent, SubscriptionCancelled,
    SubscriptionCreated, SubscriptionWalletCreated, WalletTransfer, YieldClaimed, YieldEnabled,
};
use sp_03_ledger_store::{
    Applied, LedgerRepository, NewSubscription, NewWallet, PaymentApplication, TransactionKind,
    TransactionRecord,
};
use sp_telemetry::{EVENTS_DROPPED, EVENTS_INDEXED};
use tracing::{debug, info, warn};

use super::{IndexerService, TxContext};
use crate::domain::errors::{IndexerError, IndexerResult};
use crate::domain::mapping::decode_plan;

impl<G: ChainGateway, S: LedgerRepository> IndexerService<G, S> {
    /// Apply one event. `Ok(None)` means the event was dropped (unknown
    /// discriminator).
    pub(crate) async fn dispatch(
        &self,
        event: &ProgramEvent,
        ctx: &TxContext,
    ) -> IndexerResult<Option<Applied>> {
        let result = match event {
            ProgramEvent::SubscriptionWalletCreated(e) => self.on_wallet_created(e, ctx).await,
            ProgramEvent::YieldEnabled(e) => self.on_yield_enabled(e, ctx).await,
            ProgramEvent::WalletDeposit(e) => self.on_transfer(e, TransactionKind::Deposit, ctx),
            ProgramEvent::WalletWithdrawal(e) => {
                self.on_transfer(e, TransactionKind::Withdrawal, ctx)
            }
            ProgramEvent::SubscriptionCreated(e) => self.on_subscription_created(e, ctx).await,
            ProgramEvent::PaymentExecuted(e) => self.on_payment_executed(e, ctx),
            ProgramEvent::SubscriptionCancelled(e) => self.on_subscription_cancelled(e, ctx).await,
            ProgramEvent::YieldClaimed(e) => self.on_yield_claimed(e, ctx),
            ProgramEvent::MerchantPlanRegistered(e) => self.on_plan_registered(e, ctx).await,
            ProgramEvent::Unknown { discriminator } => {
                debug!(
                    "[sp-04] Dropping unknown event {} in {}",
                    hex_prefix(discriminator),
                    ctx.signature
                );
                EVENTS_DROPPED.inc();
                return Ok(None);
            }
        };

        let outcome = match &result {
            Ok(applied) => applied.as_str(),
            Err(_) => "failed",
        };
        EVENTS_INDEXED
            .with_label_values(&[event.name(), outcome])
            .inc();
        result.map(Some)
    }

    fn record(
        &self,
        ctx: &TxContext,
        kind: TransactionKind,
        subject: Address,
    ) -> TransactionRecord {
        TransactionRecord::new(ctx.signature.clone(), kind, subject, ctx.slot).at(ctx.block_time)
    }

    /// Best-effort account fetch used to enrich events. A failure is logged
    /// and treated as "not available".
    async fn fetch_data(&self, address: &Address) -> Option<Vec<u8>> {
        match self.gateway.get_account(address).await {
            Ok(Some(account)) => Some(account.data),
            Ok(None) => None,
            Err(e) => {
                warn!("[sp-04] Failed to fetch account {}: {}", address, e);
                None
            }
        }
    }

    async fn fetch_wallet(&self, address: &Address) -> Option<SubscriptionWalletAccount> {
        let data = self.fetch_data(address).await?;
        SubscriptionWalletAccount::decode(&data)
            .map_err(|e| warn!("[sp-04] Wallet account {} does not decode: {}", address, e))
            .ok()
    }

    async fn on_wallet_created(
        &self,
        event: &SubscriptionWalletCreated,
        ctx: &TxContext,
    ) -> IndexerResult<Applied> {
        let main_token_account = self
            .fetch_wallet(&event.wallet_pda)
            .await
            .map(|account| account.main_token_account);
        let wallet = NewWallet {
            address: event.wallet_pda,
            owner: event.owner,
            mint: event.mint,
            main_token_account,
        };
        let record = self
            .record(ctx, TransactionKind::WalletCreated, event.wallet_pda)
            .between(event.owner, event.wallet_pda);
        let applied = self.store.apply_wallet_created(&wallet, record)?;
        if applied.is_fresh() {
            info!(
                "[sp-04] Wallet {} created for {}",
                event.wallet_pda, event.owner
            );
        }
        Ok(applied)
    }

    async fn on_yield_enabled(
        &self,
        event: &YieldEnabled,
        ctx: &TxContext,
    ) -> IndexerResult<Applied> {
        let (strategy, vault) = match self.fetch_wallet(&event.wallet_pda).await {
            Some(account) => {
                let vault = (account.yield_vault != Address::default()).then_some(account.yield_vault);
                (account.yield_strategy, vault)
            }
            None => {
                warn!(
                    "[sp-04] Wallet {} unavailable, recording yield without strategy",
                    event.wallet_pda
                );
                (YieldStrategy::None, None)
            }
        };
        let record = self
            .record(ctx, TransactionKind::YieldEnabled, event.wallet_pda)
            .with_amount(TokenAmount::from_u64(event.usdc_amount));
        Ok(self.store.apply_yield_enabled(
            &event.wallet_pda,
            strategy,
            vault,
            event.shares_issued,
            record,
        )?)
    }

    fn on_transfer(
        &self,
        event: &WalletTransfer,
        kind: TransactionKind,
        ctx: &TxContext,
    ) -> IndexerResult<Applied> {
        let record = self.record(ctx, kind, event.wallet_pda);
        let record = match kind {
            TransactionKind::Withdrawal => record.between(event.wallet_pda, event.user),
            _ => record.between(event.user, event.wallet_pda),
        };
        Ok(self
            .store
            .append_transaction(record.with_amount(TokenAmount::from_u64(event.amount)))?)
    }

    fn on_yield_claimed(&self, event: &YieldClaimed, ctx: &TxContext) -> IndexerResult<Applied> {
        let record = self
            .record(ctx, TransactionKind::YieldClaimed, event.wallet_pda)
            .between(event.wallet_pda, event.owner)
            .with_amount(TokenAmount::from_u64(event.amount));
        Ok(self.store.append_transaction(record)?)
    }

    /// Resolve fee, interval and plan for a new subscription. The
    /// subscription account is authoritative; when it is already gone the
    /// merchant's stored plan with the event's plan id is used.
    async fn resolve_subscription(
        &self,
        event: &SubscriptionCreated,
        ctx: &TxContext,
    ) -> IndexerResult<NewSubscription> {
        if let Some(data) = self.fetch_data(&event.subscription_pda).await {
            let state = SubscriptionStateAccount::decode(&data).map_err(|source| {
                IndexerError::Decode {
                    address: event.subscription_pda,
                    source,
                }
            })?;
            return Ok(NewSubscription {
                address: event.subscription_pda,
                user: event.user,
                subscription_wallet: event.wallet,
                merchant: event.merchant,
                merchant_plan: state.merchant_plan,
                plan_id: event.plan_id.clone(),
                mint: state.mint,
                fee_amount: TokenAmount::from_u64(state.fee_amount),
                payment_interval: state.payment_interval,
                last_payment_timestamp: state.last_payment_timestamp,
                session_token: event.session_token.clone(),
            });
        }

        let plan = self
            .store
            .plans_by_merchant(&event.merchant)?
            .into_iter()
            .find(|plan| plan.plan_id == event.plan_id)
            .ok_or(IndexerError::AccountNotFound(event.subscription_pda))?;
        warn!(
            "[sp-04] Subscription account {} unavailable, using plan {}",
            event.subscription_pda, plan.address
        );
        Ok(NewSubscription {
            address: event.subscription_pda,
            user: event.user,
            subscription_wallet: event.wallet,
            merchant: event.merchant,
            merchant_plan: plan.address,
            plan_id: event.plan_id.clone(),
            mint: plan.mint,
            fee_amount: plan.fee_amount,
            payment_interval: plan.payment_interval,
            last_payment_timestamp: ctx.block_time.unwrap_or_else(|| self.now()),
            session_token: event.session_token.clone(),
        })
    }

    async fn on_subscription_created(
        &self,
        event: &SubscriptionCreated,
        ctx: &TxContext,
    ) -> IndexerResult<Applied> {
        if self.store.has_transaction(
            &ctx.signature,
            TransactionKind::SubscriptionCreated,
            &event.subscription_pda,
        )? {
            return Ok(Applied::Duplicate);
        }

        let subscription = self.resolve_subscription(event, ctx).await?;
        let record = self
            .record(ctx, TransactionKind::SubscriptionCreated, event.subscription_pda)
            .between(event.wallet, event.merchant)
            .with_amount(subscription.fee_amount);
        let applied = self
            .store
            .apply_subscription_created(&subscription, record)?;
        if !applied.is_fresh() {
            return Ok(applied);
        }

        info!(
            "[sp-04] Subscription {} created: {} -> {} ({})",
            event.subscription_pda, event.user, event.merchant, event.plan_id
        );
        if let Some(stored) = self.store.get_subscription(&event.subscription_pda)? {
            self.notifier.subscription_created(&stored).await;
            if stored.is_active {
                if let Err(e) = self.scheduling.ensure_scheduled(&stored).await {
                    warn!(
                        "[sp-04] Could not schedule first payment for {}: {}",
                        stored.address, e
                    );
                }
            }
        }
        Ok(applied)
    }

    fn on_payment_executed(
        &self,
        event: &PaymentExecuted,
        ctx: &TxContext,
    ) -> IndexerResult<Applied> {
        let amount = TokenAmount::from_u64(event.amount);
        let payment = PaymentApplication {
            subscription: event.subscription_pda,
            amount,
            payment_number: event.payment_number,
            paid_at: ctx.block_time,
        };
        let record = self
            .record(ctx, TransactionKind::Payment, event.subscription_pda)
            .between(event.wallet_pda, event.merchant)
            .with_amount(amount);
        let applied = self.store.apply_payment(&payment, record)?;
        if applied.is_fresh() {
            info!(
                "[sp-04] Payment #{} of {} applied to {}",
                event.payment_number, amount, event.subscription_pda
            );
        }
        Ok(applied)
    }

    async fn on_subscription_cancelled(
        &self,
        event: &SubscriptionCancelled,
        ctx: &TxContext,
    ) -> IndexerResult<Applied> {
        let cancelled_at = ctx.block_time.unwrap_or_else(|| self.now());
        let record = self
            .record(ctx, TransactionKind::Cancel, event.subscription_pda)
            .between(event.merchant, event.wallet_pda);
        let outcome = self
            .store
            .apply_cancellation(&event.subscription_pda, cancelled_at, record)?;
        if !outcome.applied.is_fresh() {
            return Ok(outcome.applied);
        }

        info!(
            "[sp-04] Subscription {} cancelled after {} payments, {} pending payments cancelled",
            event.subscription_pda, event.payments_made, outcome.cancelled_payments
        );
        if let Some(stored) = self.store.get_subscription(&event.subscription_pda)? {
            self.notifier
                .subscription_cancelled(&stored, event.payments_made)
                .await;
        }
        Ok(outcome.applied)
    }

    async fn on_plan_registered(
        &self,
        event: &MerchantPlanRegistered,
        ctx: &TxContext,
    ) -> IndexerResult<Applied> {
        let account = self
            .gateway
            .get_account(&event.plan_pda)
            .await?
            .ok_or(IndexerError::AccountNotFound(event.plan_pda))?;
        let snapshot = decode_plan(&account)?;
        let record = self.record(ctx, TransactionKind::PlanRegistered, event.plan_pda);
        let applied = self.store.apply_plan_registered(&snapshot, record)?;
        if applied.is_fresh() {
            info!(
                "[sp-04] Plan {} ({}) registered by {}",
                snapshot.plan_id, snapshot.address, snapshot.merchant
            );
        }
        Ok(applied)
    }
}

fn hex_prefix(discriminator: &[u8; 8]) -> String {
    discriminator.iter().map(|b| format!("{:02x}", b)).collect()
}
