//! Canonical network addresses.
//!
//! Peers show up in differently-cased textual forms depending on which
//! client produced them; comparing the raw bytes instead of the strings is
//! what keeps conversation lookups from missing an existing thread.

use std::{fmt, str::FromStr};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// 20-byte account address on the messaging network.
///
/// Equality is on the raw bytes, so two textual forms that differ only in
/// letter case refer to the same address. [`fmt::Display`] renders the
/// checksummed form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse a `0x`-prefixed hex address, accepting any letter case.
    pub fn parse(value: &str) -> Result<Self> {
        let hex_part = value
            .strip_prefix("0x")
            .ok_or_else(|| Error::invalid_address(value))?;
        let bytes = hex::decode(hex_part).map_err(|_| Error::invalid_address(value))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| Error::invalid_address(value))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    /// Checksummed rendering: a hex letter is uppercased when the matching
    /// nibble of `sha256` of the lowercase form is 8 or above.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lower = hex::encode(self.0);
        let mut hasher = Sha256::new();
        hasher.update(lower.as_bytes());
        let digest = hasher.finalize();

        write!(f, "0x")?;
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                digest[i / 2] >> 4
            } else {
                digest[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                write!(f, "{}", c.to_ascii_uppercase())?;
            } else {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
