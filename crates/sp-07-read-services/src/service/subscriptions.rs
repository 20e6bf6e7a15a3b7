use shared_types::{Address, TokenAmount};
use sp_03_ledger_store::{LedgerRepository, Subscription, SubscriptionWallet};

use super::{ReadService, DETAIL_TRANSACTION_LIMIT};
use crate::domain::aggregate::days_until;
use crate::domain::errors::{ReadError, ReadResult};
use crate::domain::views::{SubscriptionDetail, UpcomingPayment, UserStats};
use crate::ports::inbound::SubscriptionQueryApi;

fn newest_first(mut subscriptions: Vec<Subscription>) -> Vec<Subscription> {
    subscriptions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    subscriptions
}

impl<S: LedgerRepository> SubscriptionQueryApi for ReadService<S> {
    fn subscriptions_by_user(&self, user: &Address) -> ReadResult<Vec<Subscription>> {
        Ok(newest_first(self.store.subscriptions_by_user(user)?))
    }

    fn subscriptions_by_merchant(&self, merchant: &Address) -> ReadResult<Vec<Subscription>> {
        Ok(newest_first(self.store.subscriptions_by_merchant(merchant)?))
    }

    fn subscription_detail(&self, subscription: &Address) -> ReadResult<SubscriptionDetail> {
        let found = self
            .store
            .get_subscription(subscription)?
            .ok_or(ReadError::SubscriptionNotFound(*subscription))?;
        let transactions = self
            .store
            .transactions_for(subscription, DETAIL_TRANSACTION_LIMIT)?;
        Ok(SubscriptionDetail {
            subscription: found,
            transactions,
        })
    }

    fn wallet_by_owner(&self, owner: &Address) -> ReadResult<Option<SubscriptionWallet>> {
        Ok(self
            .store
            .wallets_by_owner(owner)?
            .into_iter()
            .min_by_key(|wallet| wallet.created_at))
    }

    fn wallet(&self, wallet: &Address) -> ReadResult<SubscriptionWallet> {
        self.store
            .get_wallet(wallet)?
            .ok_or(ReadError::WalletNotFound(*wallet))
    }

    fn user_stats(&self, user: &Address) -> ReadResult<UserStats> {
        let subscriptions = self.subscriptions_by_user(user)?;
        let active_subscriptions = subscriptions.iter().filter(|s| s.is_active).count();
        let total_spent = subscriptions
            .iter()
            .fold(TokenAmount::zero(), |sum, s| sum.saturating_add(s.total_paid));
        Ok(UserStats {
            total_subscriptions: subscriptions.len(),
            active_subscriptions,
            total_spent,
            subscriptions,
        })
    }

    fn upcoming_payments(&self, user: &Address) -> ReadResult<Vec<UpcomingPayment>> {
        let now = self.now();
        let mut upcoming: Vec<UpcomingPayment> = self
            .store
            .subscriptions_by_user(user)?
            .into_iter()
            .filter(|s| s.is_active)
            .map(|s| {
                let next_payment_at = s.next_payment_at();
                UpcomingPayment {
                    subscription: s.address,
                    merchant: s.merchant,
                    amount: s.fee_amount,
                    next_payment_at,
                    days_until: days_until(next_payment_at, now),
                }
            })
            .collect();
        upcoming.sort_by_key(|p| p.next_payment_at);
        Ok(upcoming)
    }
}
