//! Executing one scheduled payment.

use shared_types::TokenAmount;
use sp_01_chain_gateway::{
    ChainGateway, PaymentReceipt, PaymentRequest, SubscriptionStateAccount,
    SubscriptionWalletAccount,
};
use sp_03_ledger_store::{
    LedgerRepository, PaymentApplication, ScheduledPayment, Subscription, TransactionKind,
    TransactionRecord,
};
use sp_telemetry::{PAYMENTS, PAYMENT_DURATION};
use std::time::Instant;
use tracing::{error, info, warn};

use super::PaymentScheduler;
use crate::domain::errors::{PaymentFailure, SchedulerResult};
use crate::domain::outcome::{PaymentFailed, PaymentOutcome, PaymentSucceeded};

impl<G: ChainGateway, S: LedgerRepository> PaymentScheduler<G, S> {
    /// Run one row through its attempt:
    ///
    /// 1. claim it (`pending` to `processing`)
    /// 2. reload the subscription, which must exist and be active
    /// 3. check the row's merchant against the subscription's
    /// 4. check the on-chain account: exists, active, same merchant, due
    /// 5. submit the payment and wait for confirmation
    /// 6. on success complete the row, apply the payment, queue the next
    ///    cycle and notify
    /// 7. on failure retry or fail per [`PaymentFailure::is_retryable`]
    ///    and the retry policy
    ///
    /// `Err` is reserved for store failures that leave the row unresolved;
    /// the reaper picks those up.
    pub async fn execute_payment(
        &self,
        payment: &ScheduledPayment,
    ) -> SchedulerResult<PaymentOutcome> {
        let started = Instant::now();
        let Some(claimed) = self.store.mark_processing(&payment.id, self.now())? else {
            info!("[sp-05] Payment {} is no longer pending", payment.id);
            return Ok(PaymentOutcome::Skipped);
        };

        let subscription = match self.store.get_subscription(&claimed.subscription)? {
            Some(subscription) if subscription.is_active => subscription,
            Some(subscription) => {
                let failure = PaymentFailure::SubscriptionInactive(subscription.address);
                return self.fail(&claimed, Some(&subscription), failure, started).await;
            }
            None => {
                let failure = PaymentFailure::SubscriptionNotFound(claimed.subscription);
                return self.fail(&claimed, None, failure, started).await;
            }
        };

        if claimed.merchant != subscription.merchant {
            error!(
                security = true,
                payment = %claimed.id,
                "[sp-05] Scheduled merchant {} does not match subscription {} merchant {}",
                claimed.merchant, subscription.address, subscription.merchant
            );
            let failure = PaymentFailure::MerchantMismatch {
                expected: subscription.merchant,
                found: claimed.merchant,
            };
            return self.fail(&claimed, Some(&subscription), failure, started).await;
        }

        let attempt = async {
            self.verify_on_chain(&subscription).await?;
            info!(
                "[sp-05] Executing payment of {} for {}",
                claimed.amount, subscription.address
            );
            let receipt = self
                .gateway
                .submit_payment(&PaymentRequest {
                    subscription: subscription.address,
                    subscription_wallet: subscription.subscription_wallet,
                    merchant_plan: subscription.merchant_plan,
                    merchant: subscription.merchant,
                    mint: subscription.mint,
                })
                .await?;
            Ok::<_, PaymentFailure>(receipt)
        };

        match attempt.await {
            Ok(receipt) => {
                self.complete(&claimed, &subscription, receipt, started)
                    .await
            }
            Err(failure) => self.fail(&claimed, Some(&subscription), failure, started).await,
        }
    }

    /// Check the subscription account as the program will see it.
    async fn verify_on_chain(&self, subscription: &Subscription) -> Result<(), PaymentFailure> {
        let account = self
            .gateway
            .get_account(&subscription.address)
            .await?
            .ok_or(PaymentFailure::SubscriptionNotFound(subscription.address))?;
        let state = SubscriptionStateAccount::decode(&account.data)?;

        if !state.is_active {
            return Err(PaymentFailure::SubscriptionInactive(subscription.address));
        }
        if state.merchant != subscription.merchant {
            return Err(PaymentFailure::MerchantMismatch {
                expected: subscription.merchant,
                found: state.merchant,
            });
        }
        let due_at = state.next_due_at();
        if self.now() < due_at {
            return Err(PaymentFailure::NotDue { due_at });
        }

        self.check_balance(&state).await
    }

    /// A wallet with yield shares can cover a shortfall from its vault, so
    /// only wallets without shares are checked up front.
    async fn check_balance(&self, state: &SubscriptionStateAccount) -> Result<(), PaymentFailure> {
        let Some(wallet) = self.wallet_account(state).await? else {
            return Ok(());
        };
        if wallet.is_yield_enabled && wallet.yield_shares > 0 {
            return Ok(());
        }
        let available = self
            .gateway
            .get_token_balance(&wallet.main_token_account)
            .await?;
        let required = TokenAmount::from_u64(state.fee_amount);
        if available < required {
            return Err(PaymentFailure::InsufficientBalance {
                required,
                available,
            });
        }
        Ok(())
    }

    async fn wallet_account(
        &self,
        state: &SubscriptionStateAccount,
    ) -> Result<Option<SubscriptionWalletAccount>, PaymentFailure> {
        let Some(account) = self.gateway.get_account(&state.subscription_wallet).await? else {
            return Ok(None);
        };
        Ok(Some(SubscriptionWalletAccount::decode(&account.data)?))
    }

    /// Token balance of the subscription's wallet, `0` when unreadable.
    async fn balance_for_report(&self, subscription: &Subscription) -> TokenAmount {
        let token_account = match self.store.get_wallet(&subscription.subscription_wallet) {
            Ok(Some(wallet)) => wallet.main_token_account,
            _ => None,
        };
        let token_account = match token_account {
            Some(address) => Some(address),
            None => match self.gateway.get_account(&subscription.subscription_wallet).await {
                Ok(Some(account)) => SubscriptionWalletAccount::decode(&account.data)
                    .ok()
                    .map(|wallet| wallet.main_token_account),
                _ => None,
            },
        };
        let Some(token_account) = token_account else {
            return TokenAmount::zero();
        };
        self.gateway
            .get_token_balance(&token_account)
            .await
            .unwrap_or_default()
    }

    async fn complete(
        &self,
        payment: &ScheduledPayment,
        subscription: &Subscription,
        receipt: PaymentReceipt,
        started: Instant,
    ) -> SchedulerResult<PaymentOutcome> {
        let executed_at = self.now();
        self.store
            .mark_completed(&payment.id, receipt.signature.clone(), executed_at)?;

        let payment_number = subscription.payment_count.saturating_add(1);
        let record = TransactionRecord::new(
            receipt.signature.clone(),
            TransactionKind::Payment,
            subscription.address,
            receipt.slot.unwrap_or_default(),
        )
        .between(subscription.subscription_wallet, subscription.merchant)
        .with_amount(payment.amount)
        .at(Some(executed_at));
        let application = PaymentApplication {
            subscription: subscription.address,
            amount: payment.amount,
            payment_number,
            paid_at: Some(executed_at),
        };
        if let Err(e) = self.store.apply_payment(&application, record) {
            error!(
                signature = %receipt.signature,
                "[sp-05] Payment landed but could not be applied to {}: {}",
                subscription.address, e
            );
        }

        let updated = match self.store.get_subscription(&subscription.address) {
            Ok(Some(updated)) => updated,
            Ok(None) => subscription.clone(),
            Err(e) => {
                warn!(
                    "[sp-05] Could not reload {} after payment: {}",
                    subscription.address, e
                );
                subscription.clone()
            }
        };
        // The next cycle is picked up again by the indexer's full sync.
        if let Err(e) = self.schedule_next_payment(&updated) {
            error!(
                "[sp-05] Payment for {} completed but the next cycle was not scheduled: {}",
                subscription.address, e
            );
        }

        self.observe("completed", started);
        info!(
            signature = %receipt.signature,
            "[sp-05] Payment #{} for {} completed",
            payment_number, subscription.address
        );

        self.notifier
            .payment_succeeded(
                &updated,
                &PaymentSucceeded {
                    amount: payment.amount,
                    payment_number,
                    signature: receipt.signature.clone(),
                },
            )
            .await;

        Ok(PaymentOutcome::Completed {
            signature: receipt.signature,
        })
    }

    /// Record a failed attempt on a `processing` row.
    pub(super) async fn fail(
        &self,
        payment: &ScheduledPayment,
        subscription: Option<&Subscription>,
        failure: PaymentFailure,
        started: Instant,
    ) -> SchedulerResult<PaymentOutcome> {
        let reason = failure.to_string();

        if !failure.is_retryable() {
            warn!(
                "[sp-05] Payment {} for {} failed permanently: {}",
                payment.id, payment.subscription, reason
            );
            self.store.fail_payment(&payment.id, &reason)?;
            self.observe("failed", started);
            return Ok(PaymentOutcome::Failed { reason });
        }

        let attempts = payment.retry_count.saturating_add(1);
        let retry_at = self.config.retry.next_retry_at(attempts, self.now());
        self.store.record_failure(&payment.id, &reason, retry_at)?;

        if let Some(retry_at) = retry_at {
            warn!(
                "[sp-05] Payment {} for {} failed ({}/{}), retrying at {}: {}",
                payment.id,
                payment.subscription,
                attempts,
                self.config.retry.max_retries,
                retry_at,
                reason
            );
            self.observe("retry", started);
            return Ok(PaymentOutcome::Retrying { retry_at, attempts });
        }

        error!(
            "[sp-05] Payment {} for {} failed after {} attempts: {}",
            payment.id, payment.subscription, attempts, reason
        );
        self.observe("failed", started);

        if let Some(subscription) = subscription {
            let balance_available = match &failure {
                PaymentFailure::InsufficientBalance { available, .. } => *available,
                _ => self.balance_for_report(subscription).await,
            };
            self.notifier
                .payment_failed(
                    subscription,
                    &PaymentFailed {
                        amount_required: payment.amount,
                        balance_available,
                        failure_count: attempts,
                        error: reason.clone(),
                    },
                )
                .await;
        }
        Ok(PaymentOutcome::Failed { reason })
    }

    fn observe(&self, outcome: &str, started: Instant) {
        PAYMENTS.with_label_values(&[outcome]).inc();
        PAYMENT_DURATION
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());
    }
}
