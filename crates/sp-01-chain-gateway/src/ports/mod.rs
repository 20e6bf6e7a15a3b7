//! Ports for the chain gateway.

pub mod inbound;
