use crate::error::{Bound, Result, VaultError};
use crate::pool::OracleBounds;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// A single oracle observation: signed 8-decimal price and the second it was updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRound {
    pub price: i128,
    pub updated_at: u64,
}

impl OracleRound {
    pub fn new(price: i128, updated_at: u64) -> Self {
        Self { price, updated_at }
    }

    /// Checks the round against `bounds` and `heartbeat_secs` at time `now`, returning
    /// the price as an unsigned integer.
    ///
    /// Checks run in a fixed order: sign, upper bound, lower bound, staleness.
    /// A round stamped in the future has age zero.
    ///
    /// # Errors
    /// `NegativeOraclePrice`, `OraclePriceOutOfBounds` or `StaleOracleData`.
    pub fn validate(&self, bounds: &OracleBounds, heartbeat_secs: u64, now: u64) -> Result<U256> {
        if self.price <= 0 {
            return Err(VaultError::NegativeOraclePrice);
        }
        if self.price > bounds.upper {
            return Err(VaultError::OraclePriceOutOfBounds(Bound::Upper));
        }
        if self.price < bounds.lower {
            return Err(VaultError::OraclePriceOutOfBounds(Bound::Lower));
        }
        if now.saturating_sub(self.updated_at) > heartbeat_secs {
            return Err(VaultError::StaleOracleData);
        }
        Ok(U256::from(self.price as u128))
    }
}
