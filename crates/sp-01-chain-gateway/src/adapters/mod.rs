//! Concrete chain adapters.

pub mod rpc;
pub mod solana;
pub mod ws;
