//! Ports: repository traits offered to the indexer, scheduler and read
//! services, and the key-value backend the store is built on.

pub mod inbound;
pub mod outbound;
