//! Binary event codec: 8-byte discriminator followed by the borsh body.
//! Trailing bytes after the last field are ignored so that appended fields
//! in newer program versions still decode.

use shared_types::layout::{
    decode_body, encode_prefixed, event_discriminator, split_discriminator,
};

use crate::domain::errors::ParseResult;
use crate::domain::events::*;

/// Decode one event payload (the bytes behind a `Program data:` line).
pub fn decode_event(data: &[u8]) -> ParseResult<ProgramEvent> {
    let (discriminator, body) = split_discriminator(data)?;
    let name = KNOWN_EVENTS
        .iter()
        .find(|name| event_discriminator(name) == discriminator);

    let event = match name.copied() {
        Some("SubscriptionWalletCreated") => {
            ProgramEvent::SubscriptionWalletCreated(decode_body(body)?)
        }
        Some("YieldEnabled") => ProgramEvent::YieldEnabled(decode_body(body)?),
        Some("WalletDeposit") => ProgramEvent::WalletDeposit(decode_body(body)?),
        Some("WalletWithdrawal") => ProgramEvent::WalletWithdrawal(decode_body(body)?),
        Some("SubscriptionCreated") => ProgramEvent::SubscriptionCreated(decode_body(body)?),
        Some("PaymentExecuted") => ProgramEvent::PaymentExecuted(decode_body(body)?),
        Some("SubscriptionCancelled") => ProgramEvent::SubscriptionCancelled(decode_body(body)?),
        Some("YieldClaimed") => ProgramEvent::YieldClaimed(decode_body(body)?),
        Some("MerchantPlanRegistered") => {
            ProgramEvent::MerchantPlanRegistered(decode_body(body)?)
        }
        _ => ProgramEvent::Unknown { discriminator },
    };

    Ok(event)
}

/// Encode an event the way the program emits it.
///
/// `Unknown` encodes to its bare discriminator.
pub fn encode_event(event: &ProgramEvent) -> ParseResult<Vec<u8>> {
    let discriminator = event.discriminator();
    let bytes = match event {
        ProgramEvent::SubscriptionWalletCreated(e) => encode_prefixed(&discriminator, e),
        ProgramEvent::YieldEnabled(e) => encode_prefixed(&discriminator, e),
        ProgramEvent::WalletDeposit(e) | ProgramEvent::WalletWithdrawal(e) => {
            encode_prefixed(&discriminator, e)
        }
        ProgramEvent::SubscriptionCreated(e) => encode_prefixed(&discriminator, e),
        ProgramEvent::PaymentExecuted(e) => encode_prefixed(&discriminator, e),
        ProgramEvent::SubscriptionCancelled(e) => encode_prefixed(&discriminator, e),
        ProgramEvent::YieldClaimed(e) => encode_prefixed(&discriminator, e),
        ProgramEvent::MerchantPlanRegistered(e) => encode_prefixed(&discriminator, e),
        ProgramEvent::Unknown { .. } => Ok(discriminator.to_vec()),
    }?;
    Ok(bytes)
}
