//! # Ledger Projection Store
//!
//! The off-chain projection of the subscription program plus the payment
//! scheduler's work queue. The store exclusively owns every entity; other
//! crates mutate it only through the repository traits in
//! [`ports::inbound`].
//!
//! | Entity | Identity | Mutated by |
//! |--------|----------|------------|
//! | [`MerchantPlan`] | plan address | plan registration, full sync, payments (revenue) |
//! | [`SubscriptionWallet`] | wallet address | wallet creation, yield enablement, full sync, payments |
//! | [`Subscription`] | subscription address | creation, payments, cancellation, full sync |
//! | [`TransactionRecord`] | signature + role + subject | append only |
//! | [`ScheduledPayment`] | UUID v4 | scheduler |
//! | [`Merchant`] | merchant wallet | merchant registration |
//!
//! ## Guarantees
//!
//! - Every event mutation and its transaction record commit in one batch.
//!   Re-delivery of the same (signature, role) is reported as
//!   [`Applied::Duplicate`] and changes nothing.
//! - At most one `pending` or `processing` scheduled payment per
//!   subscription.
//! - Revenue only accumulates; snapshots from chain never reset it.
//! - The checkpoint slot never moves backwards.
//!
//! ## Backends
//!
//! [`InMemoryKVStore`] for tests, `RocksDbStore` behind the `rocksdb`
//! feature for deployments.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::entities::{
    Merchant, MerchantPlan, NewScheduledPayment, PaymentStatus, ScheduledPayment, Subscription,
    SubscriptionWallet, TransactionKind, TransactionRecord, TransactionStatus, SECONDS_PER_MONTH,
};
pub use domain::errors::{KVStoreError, StoreError, StoreResult};
pub use domain::snapshots::{
    Applied, CancelOutcome, MerchantProfile, NewSubscription, NewWallet, PaymentApplication,
    PlanSnapshot, SubscriptionSnapshot, WalletSnapshot,
};
pub use ports::inbound::{
    CheckpointRepository, LedgerRepository, MerchantRepository, PlanRepository,
    ScheduledPaymentRepository, SubscriptionRepository, TransactionLog, WalletRepository,
};
pub use ports::outbound::{BatchOperation, InMemoryKVStore, KeyValueStore};
pub use service::LedgerStore;

#[cfg(feature = "rocksdb")]
pub use adapters::rocksdb::{RocksDbConfig, RocksDbStore};
