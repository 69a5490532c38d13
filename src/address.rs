//! Zilliqa account and contract addresses.
//!
//! An address is 20 raw bytes with three textual encodings: lowercase base16,
//! the mixed-case checksummed base16 form expected by the node for `toAddr`,
//! and bech32 with the `zil` human readable part used by wallets.

use std::fmt;
use std::str::FromStr;

use bech32::{FromBase32, ToBase32, Variant};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::errors::{TicketError, TicketResult};

pub const ADDRESS_LEN: usize = 20;
pub const BECH32_HRP: &str = "zil";

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Parses `0x`-prefixed or bare hex in any letter case.
    pub fn from_hex(value: &str) -> TicketResult<Self> {
        let trimmed = strip_hex_prefix(value.trim());
        if trimmed.len() != ADDRESS_LEN * 2 {
            return Err(TicketError::Address(format!(
                "expected {} hex characters, got {}",
                ADDRESS_LEN * 2,
                trimmed.len()
            )));
        }
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(trimmed, &mut bytes)
            .map_err(|err| TicketError::Address(format!("invalid hex address: {err}")))?;
        Ok(Self(bytes))
    }

    pub fn from_bech32(value: &str) -> TicketResult<Self> {
        let (hrp, data, variant) = bech32::decode(value.trim())
            .map_err(|err| TicketError::Address(format!("invalid bech32 address: {err}")))?;
        if hrp != BECH32_HRP {
            return Err(TicketError::Address(format!(
                "unexpected bech32 prefix `{hrp}`"
            )));
        }
        if variant != Variant::Bech32 {
            return Err(TicketError::Address("bech32m addresses are not supported".into()));
        }
        let raw = Vec::<u8>::from_base32(&data)
            .map_err(|err| TicketError::Address(format!("invalid bech32 payload: {err}")))?;
        let bytes: [u8; ADDRESS_LEN] = raw.try_into().map_err(|raw: Vec<u8>| {
            TicketError::Address(format!("bech32 payload has {} bytes", raw.len()))
        })?;
        Ok(Self(bytes))
    }

    /// `0x` followed by lowercase hex.
    pub fn to_base16(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Lowercase hex without prefix, as accepted by node RPC methods.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Mixed-case checksummed form. A hex letter at position `i` is upper
    /// case iff bit `255 - 6 * i` of SHA-256(address bytes) is set.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash: [u8; 32] = Sha256::digest(self.0).into();
        let mut checksummed = String::with_capacity(2 + lower.len());
        checksummed.push_str("0x");
        for (index, ch) in lower.chars().enumerate() {
            if ch.is_ascii_digit() || !hash_bit(&hash, 255 - 6 * index) {
                checksummed.push(ch);
            } else {
                checksummed.push(ch.to_ascii_uppercase());
            }
        }
        checksummed
    }

    pub fn to_bech32(&self) -> String {
        // Encoding 20 bytes with a static, valid hrp cannot fail.
        bech32::encode(BECH32_HRP, self.0.to_base32(), Variant::Bech32)
            .unwrap_or_else(|_| self.to_base16())
    }

    /// Compares against a textual base16 address ignoring case and prefix.
    pub fn matches_hex(&self, other: &str) -> bool {
        let other = strip_hex_prefix(other.trim());
        other.len() == ADDRESS_LEN * 2 && other.eq_ignore_ascii_case(&self.to_hex())
    }
}

/// Returns true when `value` is exactly the checksummed form of its bytes.
pub fn is_valid_checksum(value: &str) -> bool {
    match Address::from_hex(value) {
        Ok(address) => strip_hex_prefix(&address.to_checksum()) == strip_hex_prefix(value.trim()),
        Err(_) => false,
    }
}

fn hash_bit(hash: &[u8; 32], bit: usize) -> bool {
    let byte = hash[31 - bit / 8];
    (byte >> (bit % 8)) & 1 == 1
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

impl FromStr for Address {
    type Err = TicketError;

    /// Accepts base16 (any case, optional `0x`) or bech32.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.to_ascii_lowercase().starts_with(BECH32_HRP) {
            Self::from_bech32(trimmed)
        } else {
            Self::from_hex(trimmed)
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base16())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base16())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
