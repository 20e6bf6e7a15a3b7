//! # Subscription Protocol Scenario Suite
//!
//! Cross-crate scenarios run against a simulated chain.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness/          # Simulated chain, webhook outbox, deployment wiring
//! └── scenarios/
//!     ├── payments.rs      # Recurring payments, retries, terminal failure
//!     ├── indexing.rs      # Backfill gaps, idempotent replay, full sync
//!     ├── cancellation.rs  # Cancelling with open scheduled payments
//!     ├── webhooks.rs      # Signed notifications and secret rotation
//!     ├── reads.rs         # Read services over indexed data
//!     └── runtime.rs       # Live listener and task supervision
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sp-tests
//! cargo test -p sp-tests scenarios::payments::
//! ```

#![allow(dead_code)]

pub mod harness;
pub mod scenarios;
