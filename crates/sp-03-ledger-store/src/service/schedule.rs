//! Scheduled payments, merchants and the indexing checkpoint.

use shared_types::{Address, Slot, TxSignature, UnixTimestamp};
use tracing::{debug, info};
use uuid::Uuid;

use super::helpers::{cancel_pending_ops, load, put_op, scan};
use super::LedgerStore;
use crate::domain::entities::{Merchant, NewScheduledPayment, PaymentStatus, ScheduledPayment};
use crate::domain::errors::{KVStoreError, StoreError, StoreResult};
use crate::domain::keys::{merchant_key, scheduled_key, CHECKPOINT_KEY, SCHEDULED_PREFIX};
use crate::ports::inbound::{
    CheckpointRepository, MerchantRepository, ScheduledPaymentRepository,
};
use crate::ports::outbound::{BatchOperation, KeyValueStore};

impl<K: KeyValueStore> LedgerStore<K> {
    fn scheduled_rows(&self) -> StoreResult<Vec<ScheduledPayment>> {
        scan(&*self.kv.read(), SCHEDULED_PREFIX)
    }

    /// Compare-and-set a row from its current status to `to`.
    fn transition<F>(
        &self,
        id: &Uuid,
        to: PaymentStatus,
        update: F,
    ) -> StoreResult<ScheduledPayment>
    where
        F: FnOnce(&mut ScheduledPayment),
    {
        let now = self.now();
        let mut kv = self.kv.write();
        let key = scheduled_key(id);
        let mut row: ScheduledPayment =
            load(&*kv, &key)?.ok_or(StoreError::PaymentNotFound(*id))?;

        if !row.status.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                id: *id,
                from: row.status,
                to,
            });
        }

        row.status = to;
        row.updated_at = now;
        update(&mut row);
        kv.atomic_batch_write(vec![put_op(key, &row)?])?;
        Ok(row)
    }
}

impl<K: KeyValueStore> ScheduledPaymentRepository for LedgerStore<K> {
    fn schedule_if_absent(
        &self,
        payment: NewScheduledPayment,
    ) -> StoreResult<Option<ScheduledPayment>> {
        let now = self.now();
        let mut kv = self.kv.write();

        let open = scan::<K, ScheduledPayment>(&*kv, SCHEDULED_PREFIX)?
            .into_iter()
            .find(|row| row.subscription == payment.subscription && row.status.is_open());
        if let Some(row) = open {
            debug!(
                "[sp-03] Subscription {} already has open payment {} ({})",
                payment.subscription,
                row.id,
                row.status.as_str()
            );
            return Ok(None);
        }

        let row = ScheduledPayment {
            id: Uuid::new_v4(),
            subscription: payment.subscription,
            merchant: payment.merchant,
            amount: payment.amount,
            scheduled_for: payment.scheduled_for,
            status: PaymentStatus::Pending,
            retry_count: 0,
            error_message: None,
            signature: None,
            executed_at: None,
            processing_started_at: None,
            created_at: now,
            updated_at: now,
        };
        kv.atomic_batch_write(vec![put_op(scheduled_key(&row.id), &row)?])?;

        info!(
            "[sp-03] Scheduled payment {} for {} at {}",
            row.id, row.subscription, row.scheduled_for
        );
        Ok(Some(row))
    }

    fn get_scheduled(&self, id: &Uuid) -> StoreResult<Option<ScheduledPayment>> {
        load(&*self.kv.read(), &scheduled_key(id))
    }

    fn open_payment_for(&self, subscription: &Address) -> StoreResult<Option<ScheduledPayment>> {
        Ok(self
            .scheduled_rows()?
            .into_iter()
            .find(|row| &row.subscription == subscription && row.status.is_open()))
    }

    fn scheduled_for_subscription(
        &self,
        subscription: &Address,
    ) -> StoreResult<Vec<ScheduledPayment>> {
        let mut rows: Vec<ScheduledPayment> = self
            .scheduled_rows()?
            .into_iter()
            .filter(|row| &row.subscription == subscription)
            .collect();
        rows.sort_by_key(|row| (row.scheduled_for, row.created_at));
        Ok(rows)
    }

    fn payments_with_status(&self, status: PaymentStatus) -> StoreResult<Vec<ScheduledPayment>> {
        let mut rows: Vec<ScheduledPayment> = self
            .scheduled_rows()?
            .into_iter()
            .filter(|row| row.status == status)
            .collect();
        rows.sort_by_key(|row| (row.scheduled_for, row.created_at));
        Ok(rows)
    }

    fn due_payments(
        &self,
        now: UnixTimestamp,
        limit: usize,
    ) -> StoreResult<Vec<ScheduledPayment>> {
        let mut due: Vec<ScheduledPayment> = self
            .scheduled_rows()?
            .into_iter()
            .filter(|row| row.status == PaymentStatus::Pending && row.scheduled_for <= now)
            .collect();
        due.sort_by_key(|row| (row.scheduled_for, row.created_at));
        due.truncate(limit);
        Ok(due)
    }

    fn mark_processing(
        &self,
        id: &Uuid,
        now: UnixTimestamp,
    ) -> StoreResult<Option<ScheduledPayment>> {
        match self.transition(id, PaymentStatus::Processing, |row| {
            row.processing_started_at = Some(now);
        }) {
            Ok(row) => Ok(Some(row)),
            Err(StoreError::InvalidTransition { from, .. }) => {
                debug!("[sp-03] Payment {} no longer pending ({:?})", id, from);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn mark_completed(
        &self,
        id: &Uuid,
        signature: TxSignature,
        executed_at: UnixTimestamp,
    ) -> StoreResult<ScheduledPayment> {
        self.transition(id, PaymentStatus::Completed, |row| {
            row.signature = Some(signature);
            row.executed_at = Some(executed_at);
            row.error_message = None;
        })
    }

    fn fail_payment(&self, id: &Uuid, error: &str) -> StoreResult<ScheduledPayment> {
        self.transition(id, PaymentStatus::Failed, |row| {
            row.error_message = Some(error.to_string());
        })
    }

    fn record_failure(
        &self,
        id: &Uuid,
        error: &str,
        retry_at: Option<UnixTimestamp>,
    ) -> StoreResult<ScheduledPayment> {
        let to = if retry_at.is_some() {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Failed
        };
        self.transition(id, to, |row| {
            row.retry_count = row.retry_count.saturating_add(1);
            row.error_message = Some(error.to_string());
            row.processing_started_at = None;
            if let Some(at) = retry_at {
                row.scheduled_for = at;
            }
        })
    }

    fn stuck_processing(
        &self,
        started_before: UnixTimestamp,
    ) -> StoreResult<Vec<ScheduledPayment>> {
        Ok(self
            .scheduled_rows()?
            .into_iter()
            .filter(|row| {
                row.status == PaymentStatus::Processing
                    && row
                        .processing_started_at
                        .map_or(true, |started| started < started_before)
            })
            .collect())
    }

    fn cancel_pending_for(&self, subscription: &Address) -> StoreResult<usize> {
        let now = self.now();
        let mut kv = self.kv.write();
        let ops = cancel_pending_ops(&*kv, subscription, now)?;
        let cancelled = ops.len();
        if cancelled > 0 {
            kv.atomic_batch_write(ops)?;
            info!(
                "[sp-03] Cancelled {} pending payments for {}",
                cancelled, subscription
            );
        }
        Ok(cancelled)
    }

    fn purge_completed(&self, before: UnixTimestamp) -> StoreResult<usize> {
        let mut kv = self.kv.write();
        let ops: Vec<BatchOperation> = scan::<K, ScheduledPayment>(&*kv, SCHEDULED_PREFIX)?
            .into_iter()
            .filter(|row| {
                row.status == PaymentStatus::Completed
                    && row.executed_at.unwrap_or(row.updated_at) < before
            })
            .map(|row| BatchOperation::delete(scheduled_key(&row.id)))
            .collect();
        let purged = ops.len();
        if purged > 0 {
            kv.atomic_batch_write(ops)?;
            info!("[sp-03] Purged {} completed payments", purged);
        }
        Ok(purged)
    }
}

impl<K: KeyValueStore> MerchantRepository for LedgerStore<K> {
    fn get_merchant(&self, wallet: &Address) -> StoreResult<Option<Merchant>> {
        load(&*self.kv.read(), &merchant_key(wallet))
    }

    fn save_merchant(&self, merchant: &Merchant) -> StoreResult<()> {
        let mut kv = self.kv.write();
        kv.atomic_batch_write(vec![put_op(merchant_key(&merchant.wallet), merchant)?])?;
        Ok(())
    }

    fn insert_merchant_if_absent(&self, merchant: Merchant) -> StoreResult<Merchant> {
        let mut kv = self.kv.write();
        let key = merchant_key(&merchant.wallet);
        if let Some(existing) = load::<K, Merchant>(&*kv, &key)? {
            return Ok(existing);
        }
        kv.atomic_batch_write(vec![put_op(key, &merchant)?])?;
        info!("[sp-03] Merchant {} registered", merchant.wallet);
        Ok(merchant)
    }
}

fn read_checkpoint<K: KeyValueStore>(kv: &K) -> StoreResult<Option<Slot>> {
    match kv.get(CHECKPOINT_KEY)? {
        Some(bytes) => {
            let raw: [u8; 8] =
                bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| KVStoreError::CorruptionError {
                        message: format!("checkpoint has {} bytes, expected 8", bytes.len()),
                    })?;
            Ok(Some(u64::from_be_bytes(raw)))
        }
        None => Ok(None),
    }
}

impl<K: KeyValueStore> CheckpointRepository for LedgerStore<K> {
    fn last_processed_slot(&self) -> StoreResult<Option<Slot>> {
        read_checkpoint(&*self.kv.read())
    }

    fn advance_checkpoint(&self, slot: Slot) -> StoreResult<Slot> {
        let mut kv = self.kv.write();
        match read_checkpoint(&*kv)? {
            Some(stored) if stored >= slot => {
                debug!("[sp-03] Checkpoint stays at {} (offered {})", stored, slot);
                Ok(stored)
            }
            _ => {
                kv.atomic_batch_write(vec![BatchOperation::put(
                    CHECKPOINT_KEY.to_vec(),
                    slot.to_be_bytes().to_vec(),
                )])?;
                Ok(slot)
            }
        }
    }
}
