use crate::error::{Result, VaultError};
use crate::token::TokenAmount;
use primitive_types::U256;

/// Decimals of the canonical internal scale.
pub const WAD_DECIMALS: u8 = 18;
/// Decimals the stable leg is assumed to use.
pub const STABLE_DECIMALS: u8 = 6;
/// Decimals the non-stable leg must use.
pub const NON_STABLE_DECIMALS: u8 = 18;
/// Decimals of oracle prices.
pub const ORACLE_DECIMALS: u8 = 8;

/// 1e18, the canonical fixed-point unit. Split fractions are expressed against it.
pub const WAD: U256 = U256([1_000_000_000_000_000_000, 0, 0, 0]);
/// 1e12, lifts a 6-decimal stable amount onto the 18-decimal scale.
pub const STABLE_SCALE: U256 = U256([1_000_000_000_000, 0, 0, 0]);
/// 1e8, the oracle price unit.
pub const ORACLE_BASE: U256 = U256([100_000_000, 0, 0, 0]);

/// Computes `a * b / denominator` with a checked multiply and truncating division.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    let product = a.checked_mul(b).ok_or(VaultError::ArithmeticOverflow)?;
    product
        .checked_div(denominator)
        .ok_or(VaultError::ArithmeticOverflow)
}

/// Amount carved out of `parent` by a split at `fraction` (scaled by 1e18).
///
/// formula: child = floor(parent * fraction / 1e18)
///
/// The remainder of the truncation stays with the parent, so
/// `child + (parent - child) == parent` always holds.
pub fn split_amount(parent: TokenAmount, fraction: U256) -> Result<TokenAmount> {
    if fraction >= WAD {
        return Err(VaultError::InvalidSplitFraction);
    }
    mul_div(parent.0, fraction, WAD).map(TokenAmount)
}
