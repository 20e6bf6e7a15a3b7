//! Legacy text events: `Program log: <EventName>: {json}`.
//!
//! Older program builds logged events as JSON text instead of emitting
//! binary data. Keys may be snake_case or camelCase, and integers may be
//! JSON numbers or decimal strings.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::domain::errors::{ParseError, ParseResult};
use crate::domain::events::{ProgramEvent, KNOWN_EVENTS};

/// Try to read a legacy event from the text following `Program log: `.
///
/// Returns `None` for ordinary log messages.
pub fn parse_legacy_message(message: &str) -> Option<ParseResult<ProgramEvent>> {
    KNOWN_EVENTS.iter().find_map(|name| {
        let json = message.strip_prefix(name)?.strip_prefix(':')?.trim();
        json.starts_with('{').then(|| decode_json(name, json))
    })
}

fn decode_json(name: &'static str, json: &str) -> ParseResult<ProgramEvent> {
    let value: Value = serde_json::from_str(json).map_err(|e| ParseError::Json {
        event: name,
        message: e.to_string(),
    })?;
    let value = normalize_keys(value);

    fn typed<T: DeserializeOwned>(name: &'static str, value: Value) -> ParseResult<T> {
        serde_json::from_value(value).map_err(|e| ParseError::Json {
            event: name,
            message: e.to_string(),
        })
    }

    Ok(match name {
        "SubscriptionWalletCreated" => ProgramEvent::SubscriptionWalletCreated(typed(name, value)?),
        "YieldEnabled" => ProgramEvent::YieldEnabled(typed(name, value)?),
        "WalletDeposit" => ProgramEvent::WalletDeposit(typed(name, value)?),
        "WalletWithdrawal" => ProgramEvent::WalletWithdrawal(typed(name, value)?),
        "SubscriptionCreated" => ProgramEvent::SubscriptionCreated(typed(name, value)?),
        "PaymentExecuted" => ProgramEvent::PaymentExecuted(typed(name, value)?),
        "SubscriptionCancelled" => ProgramEvent::SubscriptionCancelled(typed(name, value)?),
        "YieldClaimed" => ProgramEvent::YieldClaimed(typed(name, value)?),
        _ => ProgramEvent::MerchantPlanRegistered(typed(name, value)?),
    })
}

fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (camel_to_snake(&key), value))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexInt {
    Number(u64),
    Text(String),
}

pub(crate) fn flex_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match FlexInt::deserialize(deserializer)? {
        FlexInt::Number(n) => Ok(n),
        FlexInt::Text(s) => s.trim().parse().map_err(D::Error::custom),
    }
}

pub(crate) fn flex_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let wide = flex_u64(deserializer)?;
    u32::try_from(wide).map_err(D::Error::custom)
}
