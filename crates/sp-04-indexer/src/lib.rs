//! # Indexer (sp-04)
//!
//! Mirrors the subscription program into the ledger store.
//!
//! ## Sources
//!
//! | Source | Used for |
//! |--------|----------|
//! | `getSignaturesForAddress` + `getTransaction` | backfill between the checkpoint and the tip |
//! | `logsSubscribe` | live events |
//! | `getProgramAccounts` | periodic full sync, authoritative for counters |
//!
//! Each transaction's events are parsed by sp-02 and applied in log order.
//! Every mutation is idempotent on (signature, role, subject), so replays
//! from overlapping backfills, reconnects or restarts are harmless.
//!
//! ## Side Effects
//!
//! Freshly applied `SubscriptionCreated` and `SubscriptionCancelled` events
//! are reported through [`LifecycleNotifier`], and new subscriptions are
//! handed to [`PaymentScheduling`] for their first payment.

pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use config::{IndexerConfig, MAX_SIGNATURE_PAGE};
pub use domain::errors::{IndexerError, IndexerResult};
pub use domain::report::{BackfillReport, StartupReport, SyncOutcome, SyncReport, TxOutcome};
pub use ports::outbound::{LifecycleNotifier, PaymentScheduling};
pub use service::{IndexerService, TxContext};
