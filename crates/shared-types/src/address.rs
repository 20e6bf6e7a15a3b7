//! # On-chain Addresses
//!
//! Account keys wrap [`Pubkey`]. The wrapper renders as base58 through serde
//! so stored records and webhook bodies carry the familiar string form, and
//! it narrows program-derived address (PDA) derivation to a `Result`.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use solana_pubkey::{ParsePubkeyError, Pubkey, PubkeyError, MAX_SEEDS, MAX_SEED_LEN};
use std::fmt;
use std::str::FromStr;

use crate::errors::AddressError;

/// A 32-byte account address.
#[derive(
    Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, BorshSerialize, BorshDeserialize,
)]
pub struct Address(Pubkey);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(Pubkey::new_from_array(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn to_pubkey(self) -> Pubkey {
        self.0
    }

    /// Returns true when the bytes decode to a point on the ed25519 curve.
    ///
    /// Program-derived addresses are off-curve, so no private key can sign
    /// for them.
    pub fn is_on_curve(&self) -> bool {
        self.0.is_on_curve()
    }

    fn check_seeds(seeds: &[&[u8]]) -> Result<(), AddressError> {
        if seeds.len() > MAX_SEEDS {
            return Err(AddressError::TooManySeeds(seeds.len()));
        }
        match seeds.iter().find(|seed| seed.len() > MAX_SEED_LEN) {
            Some(seed) => Err(AddressError::SeedTooLong(seed.len())),
            None => Ok(()),
        }
    }

    /// Hash seeds with an explicit bump into a program address.
    pub fn create_program_address(
        seeds: &[&[u8]],
        program_id: &Address,
    ) -> Result<Address, AddressError> {
        Self::check_seeds(seeds)?;
        Pubkey::create_program_address(seeds, &program_id.0)
            .map(Address)
            .map_err(|e| match e {
                PubkeyError::InvalidSeeds => AddressError::OnCurve,
                other => AddressError::Derivation(other.to_string()),
            })
    }

    /// Find the canonical (highest bump) program address for `seeds`.
    pub fn find_program_address(
        seeds: &[&[u8]],
        program_id: &Address,
    ) -> Result<(Address, u8), AddressError> {
        // One seed slot is reserved for the bump.
        if seeds.len() >= MAX_SEEDS {
            return Err(AddressError::TooManySeeds(seeds.len()));
        }
        Self::check_seeds(seeds)?;
        Pubkey::try_find_program_address(seeds, &program_id.0)
            .map(|(address, bump)| (Address(address), bump))
            .ok_or(AddressError::NoViableBump)
    }

    /// Associated token account of `owner` for `mint`.
    pub fn associated_token_address(
        owner: &Address,
        mint: &Address,
        token_program: &Address,
        associated_token_program: &Address,
    ) -> Result<Address, AddressError> {
        Self::find_program_address(
            &[owner.as_bytes(), token_program.as_bytes(), mint.as_bytes()],
            associated_token_program,
        )
        .map(|(address, _)| address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pubkey::from_str(s).map(Address).map_err(|e| match e {
            ParsePubkeyError::WrongSize => AddressError::InvalidLength,
            other => AddressError::InvalidBase58(other.to_string()),
        })
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Address::new(bytes)
    }
}

impl From<Pubkey> for Address {
    fn from(pubkey: Pubkey) -> Self {
        Address(pubkey)
    }
}

impl From<Address> for Pubkey {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
