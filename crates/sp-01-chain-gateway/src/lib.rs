//! # Chain Gateway (sp-01)
//!
//! Everything that touches the cluster goes through this crate: JSON-RPC
//! reads, the live `logsSubscribe` stream, typed decoding of program
//! accounts, and assembly/signing of the payment transaction.
//!
//! ## Operations
//!
//! | Operation | RPC |
//! |-----------|-----|
//! | `get_slot` | `getSlot` |
//! | `get_account` | `getAccountInfo` (base64) |
//! | `get_signatures_for_address` | `getSignaturesForAddress` (paged, newest first) |
//! | `get_transaction` | `getTransaction` (log messages only) |
//! | `get_program_accounts` | `getProgramAccounts` + discriminator memcmp |
//! | `get_token_balance` | `getTokenAccountBalance` |
//! | `subscribe_logs` | WebSocket `logsSubscribe` with `mentions` |
//! | `submit_payment` | `getLatestBlockhash`, `sendTransaction`, `getSignatureStatuses` |
//!
//! All reads use commitment "confirmed" unless configured otherwise.
//!
//! ## Crate Structure
//!
//! - `domain/` - account layouts, PDAs, transaction wire format, errors
//! - `ports/` - the [`ChainGateway`] trait
//! - `adapters/` - HTTP and WebSocket clients, [`SolanaGateway`]
//! - `config.rs` - [`GatewayConfig`] from environment

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::solana::{parse_keypair, SolanaGateway};
pub use config::GatewayConfig;
pub use domain::accounts::{
    pda, AccountKind, MerchantPlanAccount, ProtocolConfigAccount, SubscriptionStateAccount,
    SubscriptionWalletAccount,
};
pub use domain::errors::{GatewayError, GatewayResult};
pub use domain::types::{
    AccountSnapshot, Commitment, ConfirmedTransaction, LogNotification, LogStream,
    PaymentReceipt, PaymentRequest, SignatureInfo,
};
pub use ports::inbound::ChainGateway;
