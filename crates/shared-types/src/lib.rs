//! # Shared Types Crate
//!
//! Primitives used by every subscription-protocol subsystem.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`address`] | account keys over `Pubkey`, base58 serde, PDA / associated token derivation |
//! | [`amount`] | [`TokenAmount`], arbitrary-precision, decimal-string encoded |
//! | [`layout`] | discriminators and borsh framing of program data |
//! | [`strategy`] | [`YieldStrategy`] |
//! | [`time`] | [`TimeSource`] and clocks |
//! | [`single_flight`] | per-instance overlap guard for periodic jobs |
//!
//! ## Design Principles
//!
//! - **No floating point money**: every monetary value is a [`TokenAmount`].
//! - **No I/O**: this crate is pure and can be used from any layer.

pub mod address;
pub mod amount;
pub mod errors;
pub mod layout;
pub mod single_flight;
pub mod strategy;
pub mod time;

pub use address::Address;
pub use amount::TokenAmount;
pub use errors::*;
pub use layout::Discriminator;
pub use single_flight::{FlightPermit, SingleFlight};
pub use strategy::YieldStrategy;
pub use time::{MockTimeSource, SystemTimeSource, TimeSource, UnixTimestamp};

/// Transaction signature, base58 encoded.
pub type TxSignature = String;

/// Chain slot number.
pub type Slot = u64;
