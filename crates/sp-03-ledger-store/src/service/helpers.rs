//! Record encoding and batch building shared by the repository impls.

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{Address, UnixTimestamp};

use crate::domain::entities::{PaymentStatus, ScheduledPayment, TransactionRecord};
use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::keys::{scheduled_key, transaction_key, SCHEDULED_PREFIX};
use crate::ports::outbound::{BatchOperation, KeyValueStore};

pub(crate) fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn load<K, T>(kv: &K, key: &[u8]) -> StoreResult<Option<T>>
where
    K: KeyValueStore,
    T: DeserializeOwned,
{
    match kv.get(key)? {
        Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
        None => Ok(None),
    }
}

pub(crate) fn scan<K, T>(kv: &K, prefix: &[u8]) -> StoreResult<Vec<T>>
where
    K: KeyValueStore,
    T: DeserializeOwned,
{
    kv.prefix_scan(prefix)?
        .into_iter()
        .map(|(_, bytes)| bincode::deserialize(&bytes).map_err(StoreError::from))
        .collect()
}

pub(crate) fn put_op<T: Serialize>(key: Vec<u8>, value: &T) -> StoreResult<BatchOperation> {
    Ok(BatchOperation::put(key, encode(value)?))
}

pub(crate) fn record_key(record: &TransactionRecord) -> Vec<u8> {
    transaction_key(&record.signature, record.kind, &record.subject)
}

pub(crate) fn record_op(record: &TransactionRecord) -> StoreResult<BatchOperation> {
    put_op(record_key(record), record)
}

/// Batch entries cancelling every pending row of `subscription`.
pub(crate) fn cancel_pending_ops<K: KeyValueStore>(
    kv: &K,
    subscription: &Address,
    now: UnixTimestamp,
) -> StoreResult<Vec<BatchOperation>> {
    scan::<K, ScheduledPayment>(kv, SCHEDULED_PREFIX)?
        .into_iter()
        .filter(|row| &row.subscription == subscription && row.status == PaymentStatus::Pending)
        .map(|mut row| {
            row.status = PaymentStatus::Cancelled;
            row.updated_at = now;
            put_op(scheduled_key(&row.id), &row)
        })
        .collect()
}
