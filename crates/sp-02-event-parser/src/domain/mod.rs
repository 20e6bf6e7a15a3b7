//! Domain layer for the event parser.

pub mod errors;
pub mod events;
