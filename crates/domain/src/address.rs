use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A 20-byte account or contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

/// Error returned when parsing a hex address fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    /// The input did not contain exactly 40 hex digits.
    #[error("expected 40 hex digits, got {0}")]
    InvalidLength(usize),
    /// The input contained a non-hex character.
    #[error("invalid hex digit in address")]
    InvalidHex,
}

impl Address {
    /// The zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Builds an address whose low 8 bytes hold `value`.
    #[must_use]
    pub const fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        let be = value.to_be_bytes();
        let mut i = 0;
        while i < 8 {
            bytes[12 + i] = be[i];
            i += 1;
        }
        Self(bytes)
    }

    /// Parses a `0x`-prefixed 40-digit hex literal at compile time.
    ///
    /// # Panics
    /// On malformed input. Use it for `const` items, where that is a build error; parse
    /// runtime input with [`FromStr`].
    #[must_use]
    pub const fn from_hex_literal(s: &str) -> Self {
        let raw = s.as_bytes();
        assert!(
            raw.len() == 42 && raw[0] == b'0' && raw[1] == b'x',
            "expected 0x and 40 hex digits"
        );
        let mut bytes = [0u8; 20];
        let mut i = 0;
        while i < 20 {
            bytes[i] = (hex_nibble(raw[2 + 2 * i]) << 4) | hex_nibble(raw[3 + 2 * i]);
            i += 1;
        }
        Self(bytes)
    }

    /// Derives a contract address from the deploying account and its deployment nonce.
    ///
    /// The high 12 bytes carry the deployer's low 12 bytes and the low 8 bytes carry the
    /// nonce, so two deployments from the same deployer never share an address.
    #[must_use]
    pub fn derive(deployer: &Address, nonce: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[..12].copy_from_slice(&deployer.0[8..]);
        bytes[12..].copy_from_slice(&nonce.to_be_bytes());
        Self(bytes)
    }

    /// Returns true for the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

const fn hex_nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex digit in address literal"),
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if hex.len() != 40 {
            return Err(AddressParseError::InvalidLength(hex.len()));
        }
        if !hex.is_ascii() {
            return Err(AddressParseError::InvalidHex);
        }

        let mut bytes = [0u8; 20];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| AddressParseError::InvalidHex)?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_case_checksum_address() {
        let usdc: Address = "0x7F5c764cBc14f9669B88837ca1490cCa17c31607".parse().unwrap();
        assert_eq!(
            usdc.to_string(),
            "0x7f5c764cbc14f9669b88837ca1490cca17c31607"
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(AddressParseError::InvalidLength(4))
        );
        assert_eq!(
            "0xzz5c764cBc14f9669B88837ca1490cCa17c31607".parse::<Address>(),
            Err(AddressParseError::InvalidHex)
        );
    }

    #[test]
    fn test_hex_literal_matches_parser() {
        const USDC: Address =
            Address::from_hex_literal("0x7F5c764cBc14f9669B88837ca1490cCa17c31607");
        let parsed: Address = "0x7F5c764cBc14f9669B88837ca1490cCa17c31607".parse().unwrap();
        assert_eq!(USDC, parsed);
    }

    #[test]
    #[should_panic(expected = "invalid hex digit")]
    fn test_hex_literal_rejects_bad_digit() {
        let _ = Address::from_hex_literal("0xzz5c764cBc14f9669B88837ca1490cCa17c31607");
    }

    #[test]
    fn test_derive_is_unique_per_nonce() {
        let factory = Address::from_low_u64(0xFAC7);
        let first = Address::derive(&factory, 1);
        let second = Address::derive(&factory, 2);
        assert_ne!(first, second);
        assert_ne!(first, factory);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let addr = Address::from_low_u64(42);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x000000000000000000000000000000000000002a\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
