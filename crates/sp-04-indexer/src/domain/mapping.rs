//! Decoded program accounts to store snapshots.

use shared_types::Address;
use sp_01_chain_gateway::{
    AccountSnapshot, MerchantPlanAccount, SubscriptionStateAccount, SubscriptionWalletAccount,
};
use sp_03_ledger_store::{PlanSnapshot, SubscriptionSnapshot, WalletSnapshot};

use super::errors::{IndexerError, IndexerResult};

pub fn decode_plan(account: &AccountSnapshot) -> IndexerResult<PlanSnapshot> {
    let plan = MerchantPlanAccount::decode(&account.data).map_err(|source| IndexerError::Decode {
        address: account.address,
        source,
    })?;
    Ok(plan_snapshot(account.address, plan))
}

pub fn plan_snapshot(address: Address, plan: MerchantPlanAccount) -> PlanSnapshot {
    PlanSnapshot {
        address,
        merchant: plan.merchant,
        mint: plan.mint,
        plan_id: plan.plan_id,
        plan_name: plan.plan_name,
        fee_amount: plan.fee_amount,
        payment_interval: plan.payment_interval,
        is_active: plan.is_active,
        total_subscribers: plan.total_subscribers,
    }
}

pub fn decode_wallet(account: &AccountSnapshot) -> IndexerResult<WalletSnapshot> {
    let wallet =
        SubscriptionWalletAccount::decode(&account.data).map_err(|source| IndexerError::Decode {
            address: account.address,
            source,
        })?;
    Ok(wallet_snapshot(account.address, wallet))
}

pub fn wallet_snapshot(address: Address, wallet: SubscriptionWalletAccount) -> WalletSnapshot {
    // The program leaves the vault zeroed until yield is enabled.
    let yield_vault = (wallet.is_yield_enabled && wallet.yield_vault != Address::default())
        .then_some(wallet.yield_vault);
    WalletSnapshot {
        address,
        owner: wallet.owner,
        mint: wallet.mint,
        main_token_account: wallet.main_token_account,
        is_yield_enabled: wallet.is_yield_enabled,
        yield_strategy: wallet.yield_strategy,
        yield_vault,
        yield_shares: wallet.yield_shares,
        total_subscriptions: wallet.total_subscriptions,
        total_spent: wallet.total_spent,
    }
}

pub fn decode_subscription(account: &AccountSnapshot) -> IndexerResult<SubscriptionSnapshot> {
    let state =
        SubscriptionStateAccount::decode(&account.data).map_err(|source| IndexerError::Decode {
            address: account.address,
            source,
        })?;
    Ok(subscription_snapshot(account.address, state))
}

pub fn subscription_snapshot(
    address: Address,
    state: SubscriptionStateAccount,
) -> SubscriptionSnapshot {
    SubscriptionSnapshot {
        address,
        user: state.user,
        subscription_wallet: state.subscription_wallet,
        merchant: state.merchant,
        merchant_plan: state.merchant_plan,
        mint: state.mint,
        fee_amount: state.fee_amount,
        payment_interval: state.payment_interval,
        last_payment_timestamp: state.last_payment_timestamp,
        total_paid: state.total_paid,
        payment_count: state.payment_count,
        is_active: state.is_active,
        session_token: state.session_token,
    }
}
