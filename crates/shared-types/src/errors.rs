//! Error types for the shared primitives.

use thiserror::Error;

/// Address parsing and derivation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("invalid base58 address: {0}")]
    InvalidBase58(String),

    #[error("address must be 32 bytes")]
    InvalidLength,

    #[error("too many seeds: {0}")]
    TooManySeeds(usize),

    #[error("seed exceeds 32 bytes: {0}")]
    SeedTooLong(usize),

    #[error("derived address lies on the ed25519 curve")]
    OnCurve,

    #[error("no bump seed produced an off-curve address")]
    NoViableBump,

    #[error("program address derivation failed: {0}")]
    Derivation(String),
}

/// Token amount parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("invalid decimal amount: {0:?}")]
    InvalidDecimal(String),

    #[error("amount overflow")]
    Overflow,
}

/// Binary layout decode errors.
///
/// These are integrity errors: the bytes did not match the program's layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("data too short for a discriminator: {0} bytes")]
    TooShort(usize),

    #[error("discriminator mismatch for {type_name}")]
    DiscriminatorMismatch { type_name: &'static str },

    #[error("borsh: {0}")]
    Borsh(String),
}

impl From<std::io::Error> for LayoutError {
    fn from(e: std::io::Error) -> Self {
        LayoutError::Borsh(e.to_string())
    }
}
