use crate::address::Address;
use crate::error::{Result, VaultError};
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fungible token participating in a pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub name: String,
}

impl Token {
    pub fn new(
        address: Address,
        symbol: impl Into<String>,
        decimals: u8,
        name: impl Into<String>,
    ) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
            name: name.into(),
        }
    }
}

/// Raw integer token amount, expressed in the token's smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TokenAmount(pub U256);

impl TokenAmount {
    pub fn new(amount: impl Into<U256>) -> Self {
        Self(amount.into())
    }

    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// `whole * 10^decimals`, e.g. `scaled(353, 18)` is 353 tokens of an 18-decimal asset.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the result does not fit in 256 bits.
    pub fn scaled(whole: u64, decimals: u8) -> Result<Self> {
        // 10^78 overflows U256
        if decimals > 77 {
            return Err(VaultError::ArithmeticOverflow);
        }
        U256::from(whole)
            .checked_mul(U256::exp10(usize::from(decimals)))
            .map(Self)
            .ok_or(VaultError::ArithmeticOverflow)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: TokenAmount) -> Result<TokenAmount> {
        self.0
            .checked_add(other.0)
            .map(TokenAmount)
            .ok_or(VaultError::ArithmeticOverflow)
    }

    pub fn checked_sub(self, other: TokenAmount) -> Result<TokenAmount> {
        self.0
            .checked_sub(other.0)
            .map(TokenAmount)
            .ok_or(VaultError::ArithmeticOverflow)
    }

    /// Converts a human-readable decimal into raw units, truncating excess precision.
    ///
    /// Returns `None` for negative inputs or values that do not fit.
    pub fn from_decimal(d: Decimal, decimals: u8) -> Option<Self> {
        if d.is_sign_negative() {
            return None;
        }
        let multiplier =
            Decimal::try_from_i128_with_scale(10i128.checked_pow(decimals as u32)?, 0).ok()?;
        let raw = d.checked_mul(multiplier)?.trunc().to_u128()?;
        Some(Self(U256::from(raw)))
    }

    /// Converts raw units into a human-readable decimal.
    ///
    /// Returns `None` when the amount exceeds `Decimal`'s 96-bit mantissa.
    pub fn to_decimal(&self, decimals: u8) -> Option<Decimal> {
        if self.0.bits() > 127 {
            return None;
        }
        Decimal::try_from_i128_with_scale(self.0.as_u128() as i128, decimals as u32)
            .ok()
            .map(|d| d.normalize())
    }
}

impl From<u64> for TokenAmount {
    fn from(v: u64) -> Self {
        Self(U256::from(v))
    }
}

impl From<u128> for TokenAmount {
    fn from(v: u128) -> Self {
        Self(U256::from(v))
    }
}

impl From<U256> for TokenAmount {
    fn from(v: U256) -> Self {
        Self(v)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
