//! # Token Amounts
//!
//! Monetary values in the token's smallest unit. Backed by a 256-bit unsigned
//! integer so that accumulations (`total_paid`, `total_revenue`) cannot
//! overflow in practice, and serialized as a base-10 string everywhere.

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::AmountError;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(U256);

impl TokenAmount {
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(U256::from(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(self, other: TokenAmount) -> TokenAmount {
        Self(self.0.saturating_add(other.0))
    }

    pub fn checked_mul_u64(self, factor: u64) -> Option<TokenAmount> {
        self.0.checked_mul(U256::from(factor)).map(Self)
    }

    /// Integer division, `None` when `divisor` is zero.
    pub fn checked_div_u64(self, divisor: u64) -> Option<TokenAmount> {
        if divisor == 0 {
            return None;
        }
        Some(Self(self.0 / U256::from(divisor)))
    }

    /// Sum an iterator of amounts, failing on overflow.
    pub fn checked_sum<I>(amounts: I) -> Option<TokenAmount>
    where
        I: IntoIterator<Item = TokenAmount>,
    {
        amounts
            .into_iter()
            .try_fold(TokenAmount::zero(), TokenAmount::checked_add)
    }

    /// Narrow to `u64` when the value fits (on-chain amounts are `u64`).
    pub fn to_u64(&self) -> Option<u64> {
        if self.0 > U256::from(u64::MAX) {
            None
        } else {
            Some(self.0.low_u64())
        }
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenAmount({})", self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::InvalidDecimal(s.to_string()));
        }
        U256::from_dec_str(trimmed)
            .map(Self)
            .map_err(|_| AmountError::Overflow)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
