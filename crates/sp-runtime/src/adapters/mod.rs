//! Adapters connecting the subsystem crates to each other's ports.

pub mod scheduling;
pub mod webhooks;

pub use scheduling::{NoScheduling, SchedulerBridge};
pub use webhooks::WebhookBridge;
