//! Plan, wallet and subscription projection plus the transaction log.

use shared_types::{Address, TokenAmount, UnixTimestamp, YieldStrategy};
use tracing::{debug, info};

use super::helpers::{cancel_pending_ops, load, put_op, record_key, record_op, scan};
use super::LedgerStore;
use crate::domain::entities::{
    MerchantPlan, Subscription, SubscriptionWallet, TransactionKind, TransactionRecord,
};
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::keys::{
    plan_key, subscription_key, transaction_key, wallet_key, PLAN_PREFIX, SUBSCRIPTION_PREFIX,
    TRANSACTION_PREFIX, WALLET_PREFIX,
};
use crate::domain::snapshots::{
    Applied, CancelOutcome, NewSubscription, NewWallet, PaymentApplication, PlanSnapshot,
    SubscriptionSnapshot, WalletSnapshot,
};
use crate::ports::inbound::{
    PlanRepository, SubscriptionRepository, TransactionLog, WalletRepository,
};
use crate::ports::outbound::{BatchOperation, KeyValueStore};

fn merge_plan(
    snapshot: &PlanSnapshot,
    existing: Option<MerchantPlan>,
    now: UnixTimestamp,
) -> MerchantPlan {
    let fee_amount = TokenAmount::from_u64(snapshot.fee_amount);
    match existing {
        Some(mut plan) => {
            plan.merchant = snapshot.merchant;
            plan.mint = snapshot.mint;
            plan.plan_id = snapshot.plan_id.clone();
            plan.plan_name = snapshot.plan_name.clone();
            plan.fee_amount = fee_amount;
            plan.payment_interval = snapshot.payment_interval;
            plan.is_active = snapshot.is_active;
            plan.total_subscribers = snapshot.total_subscribers;
            plan.updated_at = now;
            plan
        }
        None => MerchantPlan {
            address: snapshot.address,
            merchant: snapshot.merchant,
            mint: snapshot.mint,
            plan_id: snapshot.plan_id.clone(),
            plan_name: snapshot.plan_name.clone(),
            fee_amount,
            payment_interval: snapshot.payment_interval,
            is_active: snapshot.is_active,
            total_subscribers: snapshot.total_subscribers,
            total_revenue: TokenAmount::zero(),
            category: None,
            description: None,
            created_at: now,
            updated_at: now,
        },
    }
}

fn merge_wallet(
    snapshot: &WalletSnapshot,
    existing: Option<SubscriptionWallet>,
    now: UnixTimestamp,
) -> SubscriptionWallet {
    let created_at = existing.as_ref().map_or(now, |w| w.created_at);
    SubscriptionWallet {
        address: snapshot.address,
        owner: snapshot.owner,
        mint: snapshot.mint,
        main_token_account: Some(snapshot.main_token_account),
        is_yield_enabled: snapshot.is_yield_enabled,
        yield_strategy: snapshot.yield_strategy,
        yield_vault: snapshot.yield_vault,
        yield_shares: snapshot.yield_shares,
        total_subscriptions: snapshot.total_subscriptions,
        total_spent: TokenAmount::from_u64(snapshot.total_spent),
        created_at,
        updated_at: now,
    }
}

/// Counter adjustments that travel in the same batch as a subscription
/// change. Missing plans or wallets are skipped; the next full sync
/// restores them with authoritative counters.
fn adjust_counters<K: KeyValueStore>(
    kv: &K,
    subscription: &Subscription,
    delta: i32,
    now: UnixTimestamp,
    ops: &mut Vec<BatchOperation>,
) -> StoreResult<()> {
    let apply = |count: u32| {
        if delta >= 0 {
            count.saturating_add(delta as u32)
        } else {
            count.saturating_sub(delta.unsigned_abs())
        }
    };

    let pkey = plan_key(&subscription.merchant_plan);
    match load::<K, MerchantPlan>(kv, &pkey)? {
        Some(mut plan) => {
            plan.total_subscribers = apply(plan.total_subscribers);
            plan.updated_at = now;
            ops.push(put_op(pkey, &plan)?);
        }
        None => debug!(
            "[sp-03] Plan {} not indexed yet, subscriber count not adjusted",
            subscription.merchant_plan
        ),
    }

    let wkey = wallet_key(&subscription.subscription_wallet);
    match load::<K, SubscriptionWallet>(kv, &wkey)? {
        Some(mut wallet) => {
            wallet.total_subscriptions = apply(wallet.total_subscriptions);
            wallet.updated_at = now;
            ops.push(put_op(wkey, &wallet)?);
        }
        None => debug!(
            "[sp-03] Wallet {} not indexed yet, subscription count not adjusted",
            subscription.subscription_wallet
        ),
    }
    Ok(())
}

impl<K: KeyValueStore> PlanRepository for LedgerStore<K> {
    fn get_plan(&self, address: &Address) -> StoreResult<Option<MerchantPlan>> {
        load(&*self.kv.read(), &plan_key(address))
    }

    fn plans_by_merchant(&self, merchant: &Address) -> StoreResult<Vec<MerchantPlan>> {
        Ok(self
            .all_plans()?
            .into_iter()
            .filter(|plan| &plan.merchant == merchant)
            .collect())
    }

    fn all_plans(&self) -> StoreResult<Vec<MerchantPlan>> {
        scan(&*self.kv.read(), PLAN_PREFIX)
    }

    fn upsert_plan_snapshot(&self, snapshot: &PlanSnapshot) -> StoreResult<bool> {
        let now = self.now();
        let mut kv = self.kv.write();
        let key = plan_key(&snapshot.address);
        let existing: Option<MerchantPlan> = load(&*kv, &key)?;
        let inserted = existing.is_none();
        let plan = merge_plan(snapshot, existing, now);
        kv.atomic_batch_write(vec![put_op(key, &plan)?])?;
        Ok(inserted)
    }

    fn apply_plan_registered(
        &self,
        snapshot: &PlanSnapshot,
        record: TransactionRecord,
    ) -> StoreResult<Applied> {
        let now = self.now();
        let mut kv = self.kv.write();
        if kv.exists(&record_key(&record))? {
            return Ok(Applied::Duplicate);
        }

        let key = plan_key(&snapshot.address);
        let existing: Option<MerchantPlan> = load(&*kv, &key)?;
        let plan = merge_plan(snapshot, existing, now);
        kv.atomic_batch_write(vec![put_op(key, &plan)?, record_op(&record)?])?;

        info!(
            "[sp-03] Merchant plan {} ({}) registered",
            plan.plan_id, snapshot.address
        );
        Ok(Applied::Fresh)
    }

    fn set_plan_metadata(
        &self,
        address: &Address,
        category: Option<String>,
        description: Option<String>,
    ) -> StoreResult<MerchantPlan> {
        let now = self.now();
        let mut kv = self.kv.write();
        let key = plan_key(address);
        let mut plan: MerchantPlan =
            load(&*kv, &key)?.ok_or(StoreError::PlanNotFound(*address))?;
        plan.category = category;
        plan.description = description;
        plan.updated_at = now;
        kv.atomic_batch_write(vec![put_op(key, &plan)?])?;
        Ok(plan)
    }
}

impl<K: KeyValueStore> WalletRepository for LedgerStore<K> {
    fn get_wallet(&self, address: &Address) -> StoreResult<Option<SubscriptionWallet>> {
        load(&*self.kv.read(), &wallet_key(address))
    }

    fn wallets_by_owner(&self, owner: &Address) -> StoreResult<Vec<SubscriptionWallet>> {
        Ok(self
            .all_wallets()?
            .into_iter()
            .filter(|wallet| &wallet.owner == owner)
            .collect())
    }

    fn all_wallets(&self) -> StoreResult<Vec<SubscriptionWallet>> {
        scan(&*self.kv.read(), WALLET_PREFIX)
    }

    fn upsert_wallet_snapshot(&self, snapshot: &WalletSnapshot) -> StoreResult<bool> {
        let now = self.now();
        let mut kv = self.kv.write();
        let key = wallet_key(&snapshot.address);
        let existing: Option<SubscriptionWallet> = load(&*kv, &key)?;
        let inserted = existing.is_none();
        let wallet = merge_wallet(snapshot, existing, now);
        kv.atomic_batch_write(vec![put_op(key, &wallet)?])?;
        Ok(inserted)
    }

    fn apply_wallet_created(
        &self,
        wallet: &NewWallet,
        record: TransactionRecord,
    ) -> StoreResult<Applied> {
        let now = self.now();
        let mut kv = self.kv.write();
        if kv.exists(&record_key(&record))? {
            return Ok(Applied::Duplicate);
        }

        let mut ops = vec![record_op(&record)?];
        let key = wallet_key(&wallet.address);
        if !kv.exists(&key)? {
            let created = SubscriptionWallet {
                address: wallet.address,
                owner: wallet.owner,
                mint: wallet.mint,
                main_token_account: wallet.main_token_account,
                is_yield_enabled: false,
                yield_strategy: YieldStrategy::None,
                yield_vault: None,
                yield_shares: 0,
                total_subscriptions: 0,
                total_spent: TokenAmount::zero(),
                created_at: record.block_time.unwrap_or(now),
                updated_at: now,
            };
            ops.push(put_op(key, &created)?);
        }
        kv.atomic_batch_write(ops)?;

        info!("[sp-03] Subscription wallet {} created", wallet.address);
        Ok(Applied::Fresh)
    }

    fn apply_yield_enabled(
        &self,
        wallet: &Address,
        strategy: YieldStrategy,
        vault: Option<Address>,
        shares: u64,
        record: TransactionRecord,
    ) -> StoreResult<Applied> {
        let now = self.now();
        let mut kv = self.kv.write();
        if kv.exists(&record_key(&record))? {
            return Ok(Applied::Duplicate);
        }

        let key = wallet_key(wallet);
        let mut stored: SubscriptionWallet =
            load(&*kv, &key)?.ok_or(StoreError::WalletNotFound(*wallet))?;
        if stored.is_yield_enabled {
            if stored.yield_strategy != strategy {
                return Err(StoreError::YieldAlreadyEnabled(*wallet));
            }
            // A snapshot got here first; keep its state and log the event.
            kv.atomic_batch_write(vec![record_op(&record)?])?;
            debug!(
                "[sp-03] Yield already enabled for wallet {} ({}), recorded {}",
                wallet, strategy, record.signature
            );
            return Ok(Applied::Fresh);
        }

        stored.is_yield_enabled = true;
        stored.yield_strategy = strategy;
        stored.yield_vault = vault;
        stored.yield_shares = shares;
        stored.updated_at = now;
        kv.atomic_batch_write(vec![put_op(key, &stored)?, record_op(&record)?])?;

        info!("[sp-03] Yield enabled for wallet {} ({})", wallet, strategy);
        Ok(Applied::Fresh)
    }
}

impl<K: KeyValueStore> SubscriptionRepository for LedgerStore<K> {
    fn get_subscription(&self, address: &Address) -> StoreResult<Option<Subscription>> {
        load(&*self.kv.read(), &subscription_key(address))
    }

    fn subscriptions_by_user(&self, user: &Address) -> StoreResult<Vec<Subscription>> {
        Ok(self
            .all_subscriptions()?
            .into_iter()
            .filter(|sub| &sub.user == user)
            .collect())
    }

    fn subscriptions_by_merchant(&self, merchant: &Address) -> StoreResult<Vec<Subscription>> {
        Ok(self
            .all_subscriptions()?
            .into_iter()
            .filter(|sub| &sub.merchant == merchant)
            .collect())
    }

    fn active_subscriptions(&self) -> StoreResult<Vec<Subscription>> {
        Ok(self
            .all_subscriptions()?
            .into_iter()
            .filter(|sub| sub.is_active)
            .collect())
    }

    fn all_subscriptions(&self) -> StoreResult<Vec<Subscription>> {
        scan(&*self.kv.read(), SUBSCRIPTION_PREFIX)
    }

    fn upsert_subscription_snapshot(&self, snapshot: &SubscriptionSnapshot) -> StoreResult<bool> {
        let now = self.now();
        let mut kv = self.kv.write();
        let key = subscription_key(&snapshot.address);
        let existing: Option<Subscription> = load(&*kv, &key)?;
        let inserted = existing.is_none();
        let mut ops = Vec::new();

        let subscription = match existing {
            Some(mut sub) => {
                let was_active = sub.is_active;
                sub.user = snapshot.user;
                sub.subscription_wallet = snapshot.subscription_wallet;
                sub.merchant = snapshot.merchant;
                sub.merchant_plan = snapshot.merchant_plan;
                sub.mint = snapshot.mint;
                sub.fee_amount = TokenAmount::from_u64(snapshot.fee_amount);
                sub.payment_interval = snapshot.payment_interval;
                sub.last_payment_timestamp = snapshot.last_payment_timestamp;
                sub.total_paid = TokenAmount::from_u64(snapshot.total_paid);
                sub.payment_count = snapshot.payment_count;
                sub.is_active = snapshot.is_active;
                sub.session_token = snapshot.session_token.clone();
                sub.updated_at = now;
                if was_active && !snapshot.is_active {
                    sub.cancelled_at = Some(now);
                    ops.extend(cancel_pending_ops(&*kv, &snapshot.address, now)?);
                } else if snapshot.is_active {
                    sub.cancelled_at = None;
                }
                sub
            }
            None => {
                let plan_id = load::<K, MerchantPlan>(&*kv, &plan_key(&snapshot.merchant_plan))?
                    .map(|plan| plan.plan_id)
                    .unwrap_or_default();
                Subscription {
                    address: snapshot.address,
                    user: snapshot.user,
                    subscription_wallet: snapshot.subscription_wallet,
                    merchant: snapshot.merchant,
                    merchant_plan: snapshot.merchant_plan,
                    plan_id,
                    mint: snapshot.mint,
                    fee_amount: TokenAmount::from_u64(snapshot.fee_amount),
                    payment_interval: snapshot.payment_interval,
                    last_payment_timestamp: snapshot.last_payment_timestamp,
                    total_paid: TokenAmount::from_u64(snapshot.total_paid),
                    payment_count: snapshot.payment_count,
                    is_active: snapshot.is_active,
                    session_token: snapshot.session_token.clone(),
                    created_at: now,
                    cancelled_at: (!snapshot.is_active).then_some(now),
                    updated_at: now,
                }
            }
        };

        ops.push(put_op(key, &subscription)?);
        kv.atomic_batch_write(ops)?;
        Ok(inserted)
    }

    fn apply_subscription_created(
        &self,
        new: &NewSubscription,
        record: TransactionRecord,
    ) -> StoreResult<Applied> {
        let now = self.now();
        let mut kv = self.kv.write();
        if kv.exists(&record_key(&record))? {
            return Ok(Applied::Duplicate);
        }

        let mut ops = vec![record_op(&record)?];
        let key = subscription_key(&new.address);
        if kv.exists(&key)? {
            debug!(
                "[sp-03] Subscription {} already projected, counters unchanged",
                new.address
            );
        } else {
            let subscription = Subscription {
                address: new.address,
                user: new.user,
                subscription_wallet: new.subscription_wallet,
                merchant: new.merchant,
                merchant_plan: new.merchant_plan,
                plan_id: new.plan_id.clone(),
                mint: new.mint,
                fee_amount: new.fee_amount,
                payment_interval: new.payment_interval,
                last_payment_timestamp: new.last_payment_timestamp,
                total_paid: TokenAmount::zero(),
                payment_count: 0,
                is_active: true,
                session_token: new.session_token.clone(),
                created_at: record.block_time.unwrap_or(now),
                cancelled_at: None,
                updated_at: now,
            };
            adjust_counters(&*kv, &subscription, 1, now, &mut ops)?;
            ops.push(put_op(key, &subscription)?);
        }
        kv.atomic_batch_write(ops)?;

        info!(
            "[sp-03] Subscription {} created for user {}",
            new.address, new.user
        );
        Ok(Applied::Fresh)
    }

    fn apply_payment(
        &self,
        payment: &PaymentApplication,
        record: TransactionRecord,
    ) -> StoreResult<Applied> {
        let now = self.now();
        let mut kv = self.kv.write();
        if kv.exists(&record_key(&record))? {
            return Ok(Applied::Duplicate);
        }

        let key = subscription_key(&payment.subscription);
        let mut sub: Subscription = load(&*kv, &key)?
            .ok_or(StoreError::SubscriptionNotFound(payment.subscription))?;

        sub.total_paid = sub
            .total_paid
            .checked_add(payment.amount)
            .ok_or(StoreError::AmountOverflow { field: "total_paid" })?;
        sub.payment_count = sub.payment_count.max(payment.payment_number);
        sub.last_payment_timestamp = sub
            .last_payment_timestamp
            .max(payment.paid_at.unwrap_or(now));
        sub.updated_at = now;

        let mut ops = vec![record_op(&record)?];

        let pkey = plan_key(&sub.merchant_plan);
        if let Some(mut plan) = load::<K, MerchantPlan>(&*kv, &pkey)? {
            plan.total_revenue = plan
                .total_revenue
                .checked_add(payment.amount)
                .ok_or(StoreError::AmountOverflow {
                    field: "total_revenue",
                })?;
            plan.updated_at = now;
            ops.push(put_op(pkey, &plan)?);
        }

        let wkey = wallet_key(&sub.subscription_wallet);
        if let Some(mut wallet) = load::<K, SubscriptionWallet>(&*kv, &wkey)? {
            wallet.total_spent = wallet
                .total_spent
                .checked_add(payment.amount)
                .ok_or(StoreError::AmountOverflow {
                    field: "total_spent",
                })?;
            wallet.updated_at = now;
            ops.push(put_op(wkey, &wallet)?);
        }

        ops.push(put_op(key, &sub)?);
        kv.atomic_batch_write(ops)?;

        info!(
            "[sp-03] Payment {} applied to {} (count {}, total {})",
            payment.amount, payment.subscription, sub.payment_count, sub.total_paid
        );
        Ok(Applied::Fresh)
    }

    fn apply_cancellation(
        &self,
        subscription: &Address,
        cancelled_at: UnixTimestamp,
        record: TransactionRecord,
    ) -> StoreResult<CancelOutcome> {
        let now = self.now();
        let mut kv = self.kv.write();
        if kv.exists(&record_key(&record))? {
            return Ok(CancelOutcome {
                applied: Applied::Duplicate,
                cancelled_payments: 0,
            });
        }

        let key = subscription_key(subscription);
        let mut sub: Subscription =
            load(&*kv, &key)?.ok_or(StoreError::SubscriptionNotFound(*subscription))?;

        let mut ops = vec![record_op(&record)?];
        if sub.is_active {
            sub.is_active = false;
            sub.cancelled_at = Some(cancelled_at);
            sub.updated_at = now;
            adjust_counters(&*kv, &sub, -1, now, &mut ops)?;
        }
        ops.push(put_op(key, &sub)?);

        let cancels = cancel_pending_ops(&*kv, subscription, now)?;
        let cancelled_payments = cancels.len();
        ops.extend(cancels);
        kv.atomic_batch_write(ops)?;

        info!(
            "[sp-03] Subscription {} cancelled ({} pending payments cancelled)",
            subscription, cancelled_payments
        );
        Ok(CancelOutcome {
            applied: Applied::Fresh,
            cancelled_payments,
        })
    }

    fn mark_subscription_closed(
        &self,
        subscription: &Address,
        closed_at: UnixTimestamp,
    ) -> StoreResult<Option<usize>> {
        let now = self.now();
        let mut kv = self.kv.write();
        let key = subscription_key(subscription);
        let mut sub: Subscription = match load(&*kv, &key)? {
            Some(sub) => sub,
            None => return Ok(None),
        };
        if !sub.is_active {
            return Ok(None);
        }

        sub.is_active = false;
        sub.cancelled_at = Some(closed_at);
        sub.updated_at = now;

        let mut ops = cancel_pending_ops(&*kv, subscription, now)?;
        let cancelled = ops.len();
        ops.push(put_op(key, &sub)?);
        kv.atomic_batch_write(ops)?;

        info!(
            "[sp-03] Subscription {} closed on chain, marked cancelled",
            subscription
        );
        Ok(Some(cancelled))
    }
}

impl<K: KeyValueStore> TransactionLog for LedgerStore<K> {
    fn has_transaction(
        &self,
        signature: &str,
        kind: TransactionKind,
        subject: &Address,
    ) -> StoreResult<bool> {
        Ok(self
            .kv
            .read()
            .exists(&transaction_key(signature, kind, subject))?)
    }

    fn append_transaction(&self, record: TransactionRecord) -> StoreResult<Applied> {
        let mut kv = self.kv.write();
        if kv.exists(&record_key(&record))? {
            return Ok(Applied::Duplicate);
        }
        kv.atomic_batch_write(vec![record_op(&record)?])?;
        Ok(Applied::Fresh)
    }

    fn transactions_for(
        &self,
        subject: &Address,
        limit: usize,
    ) -> StoreResult<Vec<TransactionRecord>> {
        let mut records: Vec<TransactionRecord> = self
            .all_transactions()?
            .into_iter()
            .filter(|record| &record.subject == subject)
            .collect();
        records.sort_by(|a, b| b.slot.cmp(&a.slot).then(b.block_time.cmp(&a.block_time)));
        records.truncate(limit);
        Ok(records)
    }

    fn all_transactions(&self) -> StoreResult<Vec<TransactionRecord>> {
        scan(&*self.kv.read(), TRANSACTION_PREFIX)
    }
}
