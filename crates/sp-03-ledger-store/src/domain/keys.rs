//! Key layout of the projection keyspace.
//!
//! | Prefix | Record |
//! |--------|--------|
//! | `plan/<address>` | [`MerchantPlan`](super::entities::MerchantPlan) |
//! | `wallet/<address>` | [`SubscriptionWallet`](super::entities::SubscriptionWallet) |
//! | `sub/<address>` | [`Subscription`](super::entities::Subscription) |
//! | `tx/<signature>/<kind>/<subject>` | [`TransactionRecord`](super::entities::TransactionRecord) |
//! | `sched/<uuid>` | [`ScheduledPayment`](super::entities::ScheduledPayment) |
//! | `merchant/<address>` | [`Merchant`](super::entities::Merchant) |
//! | `meta/last_processed_slot` | checkpoint, `u64` big-endian |

use shared_types::Address;
use uuid::Uuid;

use super::entities::TransactionKind;

pub const PLAN_PREFIX: &[u8] = b"plan/";
pub const WALLET_PREFIX: &[u8] = b"wallet/";
pub const SUBSCRIPTION_PREFIX: &[u8] = b"sub/";
pub const TRANSACTION_PREFIX: &[u8] = b"tx/";
pub const SCHEDULED_PREFIX: &[u8] = b"sched/";
pub const MERCHANT_PREFIX: &[u8] = b"merchant/";
pub const CHECKPOINT_KEY: &[u8] = b"meta/last_processed_slot";

fn prefixed(prefix: &[u8], id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + id.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(id.as_bytes());
    key
}

pub fn plan_key(address: &Address) -> Vec<u8> {
    prefixed(PLAN_PREFIX, &address.to_string())
}

pub fn wallet_key(address: &Address) -> Vec<u8> {
    prefixed(WALLET_PREFIX, &address.to_string())
}

pub fn subscription_key(address: &Address) -> Vec<u8> {
    prefixed(SUBSCRIPTION_PREFIX, &address.to_string())
}

pub fn transaction_key(signature: &str, kind: TransactionKind, subject: &Address) -> Vec<u8> {
    prefixed(
        TRANSACTION_PREFIX,
        &format!("{}/{}/{}", signature, kind.as_str(), subject),
    )
}

pub fn scheduled_key(id: &Uuid) -> Vec<u8> {
    prefixed(SCHEDULED_PREFIX, &id.to_string())
}

pub fn merchant_key(wallet: &Address) -> Vec<u8> {
    prefixed(MERCHANT_PREFIX, &wallet.to_string())
}
