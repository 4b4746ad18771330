//! # Player & Wallet Identity
//!
//! The host engine issues stable 128-bit player identifiers; we treat them as
//! opaque. Wallet addresses are EVM-style (`0x` + 40 hex digits) and can only
//! be constructed through the validating parser, so an invalid address never
//! reaches the store or the bridge.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Opaque, stable identifier for a player (UUID-like, engine-issued).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(u128);

impl PlayerId {
    /// Creates a player identifier from its raw 128-bit value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Creates a player identifier from 16 big-endian bytes (UUID layout).
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    /// Returns the raw 128-bit value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// Returns the identifier as 16 big-endian bytes.
    #[inline]
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Errors from wallet address validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The address does not start with `0x`.
    #[error("wallet address must start with 0x")]
    MissingPrefix,

    /// The address has the wrong number of hex digits.
    #[error("wallet address must have 40 hex digits, got {0}")]
    WrongLength(usize),

    /// The address contains a non-hexadecimal character.
    #[error("wallet address contains non-hex character {0:?}")]
    InvalidHex(char),
}

/// A validated EVM-style wallet address.
///
/// Stored normalized to lowercase hex so that two spellings of the same
/// address compare equal and index identically in the wallet store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Expected number of hex digits after the `0x` prefix.
    pub const HEX_DIGITS: usize = 40;

    /// Returns the normalized address string, including the `0x` prefix.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix("0x").ok_or(AddressError::MissingPrefix)?;

        if hex.len() != Self::HEX_DIGITS {
            return Err(AddressError::WrongLength(hex.len()));
        }

        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex(bad));
        }

        let mut normalized = String::with_capacity(2 + Self::HEX_DIGITS);
        normalized.push_str("0x");
        normalized.extend(hex.chars().map(|c| c.to_ascii_lowercase()));

        Ok(Self(normalized))
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
