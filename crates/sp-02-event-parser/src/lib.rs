//! # Event Parser (sp-02)
//!
//! Pure translation of transaction log messages into [`ProgramEvent`]s.
//!
//! ## Accepted Forms
//!
//! | Line | Decoding |
//! |------|----------|
//! | `Program data: <base64>` | 8-byte event discriminator + binary fields |
//! | `Program log: <Event>: {json}` | legacy text events, snake or camel case keys |
//!
//! Only lines emitted while the subscription program is at the top of the
//! invocation stack are considered. Malformed payloads are collected in
//! [`ParsedLogs::malformed`] and never abort parsing; unrecognized
//! discriminators become [`ProgramEvent::Unknown`].

pub mod codec;
pub mod domain;
pub mod legacy;
pub mod parser;

pub use codec::{decode_event, encode_event};
pub use domain::errors::{ParseError, ParseResult};
pub use domain::events::*;
pub use parser::{decode_program_data, EventParser, ParsedLogs};
