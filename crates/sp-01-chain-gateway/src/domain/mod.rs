//! Domain layer for the chain gateway.

pub mod accounts;
pub mod errors;
pub mod transaction;
pub mod types;
