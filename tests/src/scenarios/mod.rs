//! Scenario modules. Each holds only `#[cfg(test)]` tests.

pub mod cancellation;
pub mod indexing;
pub mod payments;
pub mod reads;
pub mod runtime;
pub mod webhooks;
