//! # Subscription Protocol Runtime
//!
//! Wires the gateway, ledger store, indexer, payment scheduler and webhook
//! notifier into one process.
//!
//! ## Startup Sequence
//!
//! 1. Load and validate [`RuntimeConfig`] from the environment
//! 2. Install logging and register metrics
//! 3. Open the ledger store (memory or RocksDB)
//! 4. Run the indexer startup: connectivity and program check, backfill
//!    from the checkpoint, full sync. Any failure here aborts the process.
//! 5. Spawn the live listener, full sync loop, payment sweep and
//!    maintenance loop
//! 6. Wait for Ctrl-C, then signal every task and wait for them to stop
//!
//! ## Modules
//!
//! - `config.rs` - [`RuntimeConfig`], [`StoreConfig`], [`ConfigError`]
//! - `adapters/` - bridges between the crates' ports
//! - `runtime.rs` - [`Runtime`], construction and task supervision

pub mod adapters;
pub mod config;
pub mod runtime;

pub use adapters::{NoScheduling, SchedulerBridge, WebhookBridge};
pub use config::{ConfigError, RuntimeConfig, StoreBackend, StoreConfig};
pub use runtime::{Runtime, SHUTDOWN_GRACE};
