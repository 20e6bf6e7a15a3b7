//! Parse failures. These never leave the parser as hard errors; they are
//! counted and logged by callers and the offending line is dropped.

use shared_types::LayoutError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid base64 payload: {0}")]
    Base64(String),

    #[error("event payload does not match layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("invalid JSON event payload for {event}: {message}")]
    Json { event: &'static str, message: String },
}

pub type ParseResult<T> = Result<T, ParseError>;
