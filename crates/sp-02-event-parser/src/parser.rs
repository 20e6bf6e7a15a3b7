//! # Log Parser
//!
//! Walks a transaction's log messages, tracking the program invocation
//! stack so that only events emitted by the subscription program itself
//! are decoded. Other programs in the same transaction (including ones
//! that emit look-alike payloads) are ignored.

use base64::{engine::general_purpose::STANDARD, Engine};
use shared_types::Address;
use tracing::debug;

use crate::codec::{decode_event, encode_event};
use crate::domain::errors::{ParseError, ParseResult};
use crate::domain::events::ProgramEvent;
use crate::legacy::parse_legacy_message;

const PROGRAM_DATA: &str = "Program data: ";
const PROGRAM_LOG: &str = "Program log: ";

/// Result of parsing one transaction's logs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedLogs {
    /// Events in log order, `Unknown` included.
    pub events: Vec<ProgramEvent>,
    /// Event-shaped lines that failed to decode.
    pub malformed: Vec<ParseError>,
}

enum Line<'a> {
    Invoke(&'a str),
    Exit,
    Data(&'a str),
    Log(&'a str),
    Other,
}

fn classify(line: &str) -> Line<'_> {
    if let Some(payload) = line.strip_prefix(PROGRAM_DATA) {
        return Line::Data(payload);
    }
    if let Some(message) = line.strip_prefix(PROGRAM_LOG) {
        return Line::Log(message);
    }
    let Some(rest) = line.strip_prefix("Program ") else {
        return Line::Other;
    };
    let mut parts = rest.splitn(2, ' ');
    let (Some(program), Some(tail)) = (parts.next(), parts.next()) else {
        return Line::Other;
    };
    if tail.starts_with("invoke [") {
        Line::Invoke(program)
    } else if tail == "success" || tail.starts_with("failed") {
        Line::Exit
    } else {
        Line::Other
    }
}

/// Decode one base64 `Program data:` payload.
pub fn decode_program_data(payload: &str) -> ParseResult<ProgramEvent> {
    // Anchor emits a single field; extra fields would be space separated.
    let first = payload.split_whitespace().next().unwrap_or_default();
    let bytes = STANDARD
        .decode(first)
        .map_err(|e| ParseError::Base64(e.to_string()))?;
    decode_event(&bytes)
}

#[derive(Debug, Clone)]
pub struct EventParser {
    program_id: String,
}

impl EventParser {
    pub fn new(program_id: &Address) -> Self {
        Self {
            program_id: program_id.to_string(),
        }
    }

    /// Parse every event the program emitted in `logs`.
    pub fn parse_logs<S: AsRef<str>>(&self, logs: &[S]) -> ParsedLogs {
        let mut parsed = ParsedLogs::default();
        let mut stack: Vec<&str> = Vec::new();

        for line in logs {
            let line = line.as_ref();
            match classify(line) {
                Line::Invoke(program) => stack.push(program),
                Line::Exit => {
                    stack.pop();
                }
                Line::Data(payload) if self.in_program(&stack) => {
                    match decode_program_data(payload) {
                        Ok(event) => parsed.events.push(event),
                        Err(e) => parsed.malformed.push(e),
                    }
                }
                Line::Log(message) if self.in_program(&stack) => {
                    match parse_legacy_message(message) {
                        Some(Ok(event)) => parsed.events.push(event),
                        Some(Err(e)) => parsed.malformed.push(e),
                        None => {}
                    }
                }
                _ => {}
            }
        }

        if !parsed.malformed.is_empty() {
            debug!(
                malformed = parsed.malformed.len(),
                parsed = parsed.events.len(),
                "[sp-02] Dropped malformed event payloads"
            );
        }
        parsed
    }

    fn in_program(&self, stack: &[&str]) -> bool {
        stack.last().is_some_and(|top| *top == self.program_id)
    }

    /// Render events as the log lines a top-level invocation of the
    /// program produces. Used to feed simulated chains.
    pub fn to_log_lines(&self, events: &[ProgramEvent]) -> ParseResult<Vec<String>> {
        let mut lines = Vec::with_capacity(events.len() + 2);
        lines.push(format!("Program {} invoke [1]", self.program_id));
        for event in events {
            lines.push(format!("{}{}", PROGRAM_DATA, STANDARD.encode(encode_event(event)?)));
        }
        lines.push(format!("Program {} success", self.program_id));
        Ok(lines)
    }
}
