//! Numeric wire types: token amounts and Unix timestamps.
//!
//! Both serialize as decimal strings. The x402 wire format never carries
//! bare JSON numbers for these fields because JavaScript peers cannot
//! represent the full 64- or 256-bit range without precision loss.

use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use std::time::SystemTime;

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A token amount in the asset's smallest unit (e.g. 1 USDC = `1000000`).
///
/// Arbitrary-precision non-negative integer; serialized as a decimal string
/// such as `"1000000"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TokenAmount(pub U256);

impl TokenAmount {
    /// Zero tokens.
    pub const ZERO: Self = Self(U256::ZERO);

    /// Creates an amount from a `u64` of smallest units.
    #[must_use]
    pub fn from_units(units: u64) -> Self {
        Self(U256::from(units))
    }
}

impl From<U256> for TokenAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<TokenAmount> for U256 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let value = U256::from_str(&s)
            .map_err(|_| serde::de::Error::custom("amount must be a non-negative integer"))?;
        Ok(Self(value))
    }
}

/// Seconds since the Unix epoch.
///
/// Bounds the validity window of a payment authorization: `validAfter` is the
/// earliest instant the authorization may be used (inclusive), `validBefore`
/// the instant it expires (exclusive). Serialized as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnixTimestamp(u64);

impl UnixTimestamp {
    /// Creates a timestamp from raw seconds.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// The current system time.
    ///
    /// # Panics
    ///
    /// Panics if the system clock reports a time before the Unix epoch.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("system clock before the Unix epoch")
            .as_secs();
        Self(secs)
    }

    /// Raw seconds since the epoch.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let secs = s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("timestamp must be a non-negative integer"))?;
        Ok(Self(secs))
    }
}
