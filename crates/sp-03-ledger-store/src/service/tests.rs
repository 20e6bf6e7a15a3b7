use std::sync::Arc;

use shared_types::{Address, MockTimeSource, TokenAmount, YieldStrategy};

use super::LedgerStore;
use crate::domain::entities::{
    NewScheduledPayment, PaymentStatus, TransactionKind, TransactionRecord,
};
use crate::domain::errors::StoreError;
use crate::domain::snapshots::{
    Applied, NewSubscription, NewWallet, PaymentApplication, PlanSnapshot, SubscriptionSnapshot,
    WalletSnapshot,
};
use crate::ports::inbound::*;
use crate::ports::outbound::InMemoryKVStore;

const T0: i64 = 1_700_000_000;
const FEE: u64 = 1_000_000;
const MONTH: i64 = 2_592_000;

fn addr(n: u8) -> Address {
    Address::new([n; 32])
}

fn plan_addr() -> Address {
    addr(10)
}
fn wallet_addr() -> Address {
    addr(20)
}
fn sub_addr() -> Address {
    addr(30)
}
fn merchant() -> Address {
    addr(40)
}
fn user() -> Address {
    addr(50)
}

fn store() -> (Arc<MockTimeSource>, LedgerStore<InMemoryKVStore>) {
    let clock = Arc::new(MockTimeSource::new(T0));
    let store = LedgerStore::in_memory_with_clock(clock.clone());
    (clock, store)
}

fn plan_snapshot(subscribers: u32) -> PlanSnapshot {
    PlanSnapshot {
        address: plan_addr(),
        merchant: merchant(),
        mint: addr(60),
        plan_id: "pro".to_string(),
        plan_name: "Pro".to_string(),
        fee_amount: FEE,
        payment_interval: MONTH,
        is_active: true,
        total_subscribers: subscribers,
    }
}

fn new_subscription() -> NewSubscription {
    NewSubscription {
        address: sub_addr(),
        user: user(),
        subscription_wallet: wallet_addr(),
        merchant: merchant(),
        merchant_plan: plan_addr(),
        plan_id: "pro".to_string(),
        mint: addr(60),
        fee_amount: TokenAmount::from_u64(FEE),
        payment_interval: MONTH,
        last_payment_timestamp: T0,
        session_token: String::new(),
    }
}

/// Plan, wallet and one active subscription, all through event mutations.
fn seeded() -> (Arc<MockTimeSource>, LedgerStore<InMemoryKVStore>) {
    let (clock, store) = store();
    store.upsert_plan_snapshot(&plan_snapshot(0)).unwrap();
    store
        .apply_wallet_created(
            &NewWallet {
                address: wallet_addr(),
                owner: user(),
                mint: addr(60),
                main_token_account: None,
            },
            TransactionRecord::new("w1", TransactionKind::WalletCreated, wallet_addr(), 1),
        )
        .unwrap();
    store
        .apply_subscription_created(
            &new_subscription(),
            TransactionRecord::new("s1", TransactionKind::SubscriptionCreated, sub_addr(), 2),
        )
        .unwrap();
    (clock, store)
}

fn payment(number: u32, at: i64) -> PaymentApplication {
    PaymentApplication {
        subscription: sub_addr(),
        amount: TokenAmount::from_u64(FEE),
        payment_number: number,
        paid_at: Some(at),
    }
}

fn payment_record(sig: &str) -> TransactionRecord {
    TransactionRecord::new(sig, TransactionKind::Payment, sub_addr(), 3)
        .with_amount(TokenAmount::from_u64(FEE))
        .between(user(), merchant())
}

fn schedule(store: &LedgerStore<InMemoryKVStore>, at: i64) -> Option<uuid::Uuid> {
    store
        .schedule_if_absent(NewScheduledPayment {
            subscription: sub_addr(),
            merchant: merchant(),
            amount: TokenAmount::from_u64(FEE),
            scheduled_for: at,
        })
        .unwrap()
        .map(|row| row.id)
}

// =============================================================================
// Projection
// =============================================================================

#[test]
fn test_subscription_created_increments_counters_once() {
    let (_, store) = seeded();

    let again = store
        .apply_subscription_created(
            &new_subscription(),
            TransactionRecord::new("s1", TransactionKind::SubscriptionCreated, sub_addr(), 2),
        )
        .unwrap();
    assert_eq!(again, Applied::Duplicate);

    assert_eq!(store.get_plan(&plan_addr()).unwrap().unwrap().total_subscribers, 1);
    assert_eq!(
        store.get_wallet(&wallet_addr()).unwrap().unwrap().total_subscriptions,
        1
    );
    let sub = store.get_subscription(&sub_addr()).unwrap().unwrap();
    assert!(sub.is_active);
    assert_eq!(sub.next_payment_at(), T0 + MONTH);
}

#[test]
fn test_duplicate_payment_is_not_double_counted() {
    let (_, store) = seeded();

    assert_eq!(
        store.apply_payment(&payment(1, T0 + MONTH), payment_record("p1")).unwrap(),
        Applied::Fresh
    );
    assert_eq!(
        store.apply_payment(&payment(1, T0 + MONTH), payment_record("p1")).unwrap(),
        Applied::Duplicate
    );

    let sub = store.get_subscription(&sub_addr()).unwrap().unwrap();
    assert_eq!(sub.payment_count, 1);
    assert_eq!(sub.total_paid.to_string(), "1000000");
    assert_eq!(sub.last_payment_timestamp, T0 + MONTH);
    assert_eq!(
        store.get_plan(&plan_addr()).unwrap().unwrap().total_revenue,
        TokenAmount::from_u64(FEE)
    );
}

#[test]
fn test_n_payments_accumulate_exactly() {
    let (_, store) = seeded();
    for n in 1..=12u32 {
        store
            .apply_payment(
                &payment(n, T0 + MONTH * n as i64),
                payment_record(&format!("p{}", n)),
            )
            .unwrap();
    }

    let expected = TokenAmount::from_u64(FEE).checked_mul_u64(12).unwrap();
    let sub = store.get_subscription(&sub_addr()).unwrap().unwrap();
    assert_eq!(sub.total_paid, expected);
    assert_eq!(sub.payment_count, 12);
    assert_eq!(store.get_plan(&plan_addr()).unwrap().unwrap().total_revenue, expected);
    assert_eq!(store.get_wallet(&wallet_addr()).unwrap().unwrap().total_spent, expected);
}

#[test]
fn test_out_of_order_payment_keeps_latest_timestamp() {
    let (_, store) = seeded();
    store.apply_payment(&payment(2, T0 + 2 * MONTH), payment_record("p2")).unwrap();
    store.apply_payment(&payment(1, T0 + MONTH), payment_record("p1")).unwrap();

    let sub = store.get_subscription(&sub_addr()).unwrap().unwrap();
    assert_eq!(sub.payment_count, 2);
    assert_eq!(sub.last_payment_timestamp, T0 + 2 * MONTH);
}

#[test]
fn test_payment_for_unknown_subscription() {
    let (_, store) = store();
    let err = store.apply_payment(&payment(1, T0), payment_record("p1")).unwrap_err();
    assert_eq!(err, StoreError::SubscriptionNotFound(sub_addr()));
    assert!(!store
        .has_transaction("p1", TransactionKind::Payment, &sub_addr())
        .unwrap());
}

#[test]
fn test_snapshot_sync_keeps_revenue_and_metadata() {
    let (_, store) = seeded();
    store.apply_payment(&payment(1, T0 + MONTH), payment_record("p1")).unwrap();
    store
        .set_plan_metadata(&plan_addr(), Some("video".into()), Some("HD".into()))
        .unwrap();

    let inserted = store.upsert_plan_snapshot(&plan_snapshot(7)).unwrap();
    assert!(!inserted);

    let plan = store.get_plan(&plan_addr()).unwrap().unwrap();
    assert_eq!(plan.total_subscribers, 7);
    assert_eq!(plan.total_revenue, TokenAmount::from_u64(FEE));
    assert_eq!(plan.category.as_deref(), Some("video"));
}

fn yield_record(sig: &str) -> TransactionRecord {
    TransactionRecord::new(sig, TransactionKind::YieldEnabled, wallet_addr(), 5)
}

#[test]
fn test_yield_enabled_only_once() {
    let (_, store) = seeded();
    let kamino = YieldStrategy::KaminoLend;

    store
        .apply_yield_enabled(&wallet_addr(), kamino, Some(addr(70)), 10, yield_record("y1"))
        .unwrap();
    let replay = store
        .apply_yield_enabled(&wallet_addr(), kamino, Some(addr(70)), 10, yield_record("y1"))
        .unwrap();
    assert_eq!(replay, Applied::Duplicate);
    let marginfi = YieldStrategy::MarginfiLend;
    let err = store
        .apply_yield_enabled(&wallet_addr(), marginfi, None, 0, yield_record("y2"))
        .unwrap_err();
    assert_eq!(err, StoreError::YieldAlreadyEnabled(wallet_addr()));

    let wallet = store.get_wallet(&wallet_addr()).unwrap().unwrap();
    assert_eq!(wallet.yield_strategy, kamino);
}

#[test]
fn test_yield_event_after_snapshot_is_recorded() {
    let (_, store) = seeded();
    store
        .upsert_wallet_snapshot(&WalletSnapshot {
            address: wallet_addr(),
            owner: user(),
            mint: addr(60),
            main_token_account: addr(61),
            is_yield_enabled: true,
            yield_strategy: YieldStrategy::KaminoLend,
            yield_vault: Some(addr(70)),
            yield_shares: 25,
            total_subscriptions: 1,
            total_spent: 0,
        })
        .unwrap();

    let applied = store
        .apply_yield_enabled(
            &wallet_addr(),
            YieldStrategy::KaminoLend,
            Some(addr(70)),
            10,
            yield_record("y1"),
        )
        .unwrap();

    assert_eq!(applied, Applied::Fresh);
    assert!(store
        .has_transaction("y1", TransactionKind::YieldEnabled, &wallet_addr())
        .unwrap());
    let wallet = store.get_wallet(&wallet_addr()).unwrap().unwrap();
    assert_eq!(wallet.yield_shares, 25);
}

#[test]
fn test_cancellation_releases_counters_and_pending_rows() {
    let (_, store) = seeded();
    let id = schedule(&store, T0 + MONTH).unwrap();

    let outcome = store
        .apply_cancellation(
            &sub_addr(),
            T0 + 10,
            TransactionRecord::new("c1", TransactionKind::Cancel, sub_addr(), 9),
        )
        .unwrap();
    assert_eq!(outcome.applied, Applied::Fresh);
    assert_eq!(outcome.cancelled_payments, 1);

    let sub = store.get_subscription(&sub_addr()).unwrap().unwrap();
    assert!(!sub.is_active);
    assert_eq!(sub.cancelled_at, Some(T0 + 10));
    assert_eq!(store.get_plan(&plan_addr()).unwrap().unwrap().total_subscribers, 0);
    assert_eq!(
        store.get_scheduled(&id).unwrap().unwrap().status,
        PaymentStatus::Cancelled
    );
    assert!(store.due_payments(T0 + 2 * MONTH, 50).unwrap().is_empty());

    // Replay does nothing, and counters never go below zero.
    let replay = store
        .apply_cancellation(
            &sub_addr(),
            T0 + 10,
            TransactionRecord::new("c1", TransactionKind::Cancel, sub_addr(), 9),
        )
        .unwrap();
    assert_eq!(replay.applied, Applied::Duplicate);
    assert_eq!(store.get_plan(&plan_addr()).unwrap().unwrap().total_subscribers, 0);
}

#[test]
fn test_inactive_snapshot_cancels_pending() {
    let (_, store) = seeded();
    let id = schedule(&store, T0 + MONTH).unwrap();

    store
        .upsert_subscription_snapshot(&SubscriptionSnapshot {
            address: sub_addr(),
            user: user(),
            subscription_wallet: wallet_addr(),
            merchant: merchant(),
            merchant_plan: plan_addr(),
            mint: addr(60),
            fee_amount: FEE,
            payment_interval: MONTH,
            last_payment_timestamp: T0,
            total_paid: 0,
            payment_count: 0,
            is_active: false,
            session_token: String::new(),
        })
        .unwrap();

    assert_eq!(
        store.get_scheduled(&id).unwrap().unwrap().status,
        PaymentStatus::Cancelled
    );
    let sub = store.get_subscription(&sub_addr()).unwrap().unwrap();
    assert_eq!(sub.plan_id, "pro");
    assert!(sub.cancelled_at.is_some());
}

#[test]
fn test_closed_account_reconciliation() {
    let (_, store) = seeded();
    schedule(&store, T0 + MONTH).unwrap();

    assert_eq!(store.mark_subscription_closed(&sub_addr(), T0 + 5).unwrap(), Some(1));
    assert_eq!(store.mark_subscription_closed(&sub_addr(), T0 + 6).unwrap(), None);
    assert!(store.active_subscriptions().unwrap().is_empty());
}

#[test]
fn test_wallet_snapshot_overwrites_counters() {
    let (_, store) = seeded();
    store
        .upsert_wallet_snapshot(&WalletSnapshot {
            address: wallet_addr(),
            owner: user(),
            mint: addr(60),
            main_token_account: addr(61),
            is_yield_enabled: false,
            yield_strategy: YieldStrategy::None,
            yield_vault: None,
            yield_shares: 0,
            total_subscriptions: 3,
            total_spent: 5,
        })
        .unwrap();
    let wallet = store.get_wallet(&wallet_addr()).unwrap().unwrap();
    assert_eq!(wallet.total_subscriptions, 3);
    assert_eq!(wallet.main_token_account, Some(addr(61)));
    assert_eq!(store.wallets_by_owner(&user()).unwrap().len(), 1);
}

#[test]
fn test_transactions_for_subject_newest_first() {
    let (_, store) = seeded();
    for (sig, slot) in [("a", 10u64), ("b", 30), ("c", 20)] {
        let record = TransactionRecord::new(sig, TransactionKind::Deposit, wallet_addr(), slot);
        store.append_transaction(record).unwrap();
    }
    let slots: Vec<u64> = store
        .transactions_for(&wallet_addr(), 2)
        .unwrap()
        .iter()
        .map(|r| r.slot)
        .collect();
    assert_eq!(slots, vec![30, 20]);
}

// =============================================================================
// Scheduled payments
// =============================================================================

#[test]
fn test_at_most_one_open_row() {
    let (clock, store) = seeded();
    let id = schedule(&store, T0 + MONTH).unwrap();
    assert!(schedule(&store, T0 + MONTH).is_none());

    clock.set(T0 + MONTH);
    store.mark_processing(&id, T0 + MONTH).unwrap().unwrap();
    assert!(schedule(&store, T0 + 2 * MONTH).is_none());

    store.mark_completed(&id, "sig".into(), T0 + MONTH).unwrap();
    assert!(schedule(&store, T0 + 2 * MONTH).is_some());
}

#[test]
fn test_mark_processing_is_compare_and_set() {
    let (_, store) = seeded();
    let id = schedule(&store, T0).unwrap();
    assert!(store.mark_processing(&id, T0).unwrap().is_some());
    assert!(store.mark_processing(&id, T0).unwrap().is_none());

    let missing = uuid::Uuid::new_v4();
    assert_eq!(
        store.mark_processing(&missing, T0).unwrap_err(),
        StoreError::PaymentNotFound(missing)
    );
}

#[test]
fn test_retry_then_terminal_failure() {
    let (_, store) = seeded();
    let id = schedule(&store, T0).unwrap();

    store.mark_processing(&id, T0).unwrap();
    let row = store.record_failure(&id, "insufficient funds", Some(T0 + 300)).unwrap();
    assert_eq!(row.status, PaymentStatus::Pending);
    assert_eq!(row.retry_count, 1);
    assert_eq!(row.scheduled_for, T0 + 300);
    assert!(store.due_payments(T0 + 299, 50).unwrap().is_empty());
    assert_eq!(store.due_payments(T0 + 300, 50).unwrap().len(), 1);

    store.mark_processing(&id, T0 + 300).unwrap();
    let row = store.record_failure(&id, "insufficient funds", None).unwrap();
    assert_eq!(row.status, PaymentStatus::Failed);
    assert_eq!(row.retry_count, 2);

    // Terminal rows do not block a new schedule and cannot be reclaimed.
    assert!(store.mark_processing(&id, T0 + 400).unwrap().is_none());
    assert!(schedule(&store, T0 + MONTH).is_some());
}

#[test]
fn test_completed_cannot_be_failed() {
    let (_, store) = seeded();
    let id = schedule(&store, T0).unwrap();
    store.mark_processing(&id, T0).unwrap();
    store.mark_completed(&id, "sig".into(), T0).unwrap();

    let err = store.fail_payment(&id, "late").unwrap_err();
    assert!(matches!(
        err,
        StoreError::InvalidTransition {
            from: PaymentStatus::Completed,
            to: PaymentStatus::Failed,
            ..
        }
    ));
}

#[test]
fn test_due_payments_ordered_and_limited() {
    let (_, store) = store();
    for n in 0..5u8 {
        store
            .schedule_if_absent(NewScheduledPayment {
                subscription: addr(100 + n),
                merchant: merchant(),
                amount: TokenAmount::from_u64(1),
                scheduled_for: T0 - n as i64,
            })
            .unwrap();
    }
    let due = store.due_payments(T0, 3).unwrap();
    let times: Vec<i64> = due.iter().map(|row| row.scheduled_for).collect();
    assert_eq!(times, vec![T0 - 4, T0 - 3, T0 - 2]);
}

#[test]
fn test_stuck_processing_and_purge() {
    let (clock, store) = seeded();
    let id = schedule(&store, T0).unwrap();
    store.mark_processing(&id, T0).unwrap();

    assert!(store.stuck_processing(T0).unwrap().is_empty());
    assert_eq!(store.stuck_processing(T0 + 901).unwrap().len(), 1);

    store.mark_completed(&id, "sig".into(), T0).unwrap();
    clock.set(T0 + 31 * 86_400);
    assert_eq!(store.purge_completed(T0 - 1).unwrap(), 0);
    assert_eq!(store.purge_completed(T0 + 1).unwrap(), 1);
    assert!(store.get_scheduled(&id).unwrap().is_none());
}

// =============================================================================
// Merchants and checkpoint
// =============================================================================

#[test]
fn test_checkpoint_is_monotonic() {
    let (_, store) = store();
    assert_eq!(store.last_processed_slot().unwrap(), None);
    assert_eq!(store.advance_checkpoint(100).unwrap(), 100);
    assert_eq!(store.advance_checkpoint(90).unwrap(), 100);
    assert_eq!(store.advance_checkpoint(150).unwrap(), 150);
    assert_eq!(store.last_processed_slot().unwrap(), Some(150));
}

#[test]
fn test_merchant_insert_if_absent_keeps_first() {
    let (_, store) = store();
    let first = crate::domain::entities::Merchant {
        wallet: merchant(),
        company_name: Some("Acme".into()),
        email: None,
        logo_url: None,
        webhook_url: None,
        webhook_secret: "aa".repeat(32),
        created_at: T0,
        updated_at: T0,
    };
    let mut second = first.clone();
    second.webhook_secret = "bb".repeat(32);

    store.insert_merchant_if_absent(first.clone()).unwrap();
    let stored = store.insert_merchant_if_absent(second).unwrap();
    assert_eq!(stored, first);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn replayed_payments_count_once(order in proptest::collection::vec(1u32..=8, 1..40)) {
            let (_, store) = seeded();
            for n in &order {
                let paid_at = T0 + MONTH * *n as i64;
                store
                    .apply_payment(&payment(*n, paid_at), payment_record(&format!("p{}", n)))
                    .unwrap();
            }

            let distinct: std::collections::BTreeSet<u32> = order.iter().copied().collect();
            let max = *distinct.iter().max().unwrap();
            let sub = store.get_subscription(&sub_addr()).unwrap().unwrap();
            prop_assert_eq!(
                sub.total_paid,
                TokenAmount::from_u64(FEE).checked_mul_u64(distinct.len() as u64).unwrap()
            );
            prop_assert_eq!(sub.payment_count, max);
            prop_assert_eq!(sub.last_payment_timestamp, T0 + MONTH * max as i64);
        }
    }
}
