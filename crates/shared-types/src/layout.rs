//! # Program Binary Layout
//!
//! The subscription program serializes events and accounts as an 8-byte
//! discriminator followed by the borsh encoding of the type. Discriminators
//! are the first 8 bytes of `sha256("<namespace>:<Name>")`, with namespace
//! `event`, `account` or `global` (instructions).
//!
//! Bodies decode with [`BorshDeserialize::deserialize`], which leaves
//! trailing bytes alone: accounts are allocated with headroom and newer
//! program versions append fields.

use borsh::{BorshDeserialize, BorshSerialize};
use sha2::{Digest, Sha256};

use crate::errors::LayoutError;

pub type Discriminator = [u8; 8];

fn namespaced_discriminator(namespace: &str, name: &str) -> Discriminator {
    let digest = Sha256::digest(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

pub fn event_discriminator(name: &str) -> Discriminator {
    namespaced_discriminator("event", name)
}

pub fn account_discriminator(name: &str) -> Discriminator {
    namespaced_discriminator("account", name)
}

pub fn instruction_discriminator(name: &str) -> Discriminator {
    namespaced_discriminator("global", name)
}

/// Split `data` into its discriminator and body.
pub fn split_discriminator(data: &[u8]) -> Result<(Discriminator, &[u8]), LayoutError> {
    if data.len() < 8 {
        return Err(LayoutError::TooShort(data.len()));
    }
    let (head, body) = data.split_at(8);
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(head);
    Ok((discriminator, body))
}

/// Decode a borsh body, ignoring anything after the last field.
pub fn decode_body<T: BorshDeserialize>(body: &[u8]) -> Result<T, LayoutError> {
    let mut cursor = body;
    Ok(T::deserialize(&mut cursor)?)
}

/// Check the discriminator of `data`, then decode the body as `T`.
pub fn decode_prefixed<T: BorshDeserialize>(
    data: &[u8],
    expected: &Discriminator,
    type_name: &'static str,
) -> Result<T, LayoutError> {
    let (discriminator, body) = split_discriminator(data)?;
    if &discriminator != expected {
        return Err(LayoutError::DiscriminatorMismatch { type_name });
    }
    decode_body(body)
}

/// The discriminator followed by the borsh encoding of `value`.
pub fn encode_prefixed<T: BorshSerialize>(
    discriminator: &Discriminator,
    value: &T,
) -> Result<Vec<u8>, LayoutError> {
    let mut out = discriminator.to_vec();
    value.serialize(&mut out)?;
    Ok(out)
}
