use crate::address::Address;
use crate::error::{Result, VaultError};
use crate::math::fixed_point::{NON_STABLE_DECIMALS, STABLE_DECIMALS};
use crate::token::Token;
use serde::{Deserialize, Serialize};

/// Which pool leg is the USD-stable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StableLeg {
    TokenA,
    TokenB,
}

/// Accepted oracle price range, in the oracle's 8-decimal units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleBounds {
    pub lower: i128,
    pub upper: i128,
}

impl OracleBounds {
    pub fn new(lower: i128, upper: i128) -> Self {
        Self { lower, upper }
    }
}

/// Immutable description of the pool a registry values.
///
/// The stable leg is resolved once, here, by comparing both token addresses against the
/// designated stable asset. Valuation never re-derives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    token_a: Token,
    token_b: Token,
    stable_pair: bool,
    oracle: Address,
    bounds: OracleBounds,
    heartbeat_secs: u64,
    stable_leg: StableLeg,
}

impl PoolConfig {
    /// Validates and builds a pool configuration.
    ///
    /// # Errors
    /// Returns `InvalidPoolConfig` when neither leg is `stable_asset`, both legs are the
    /// same token, the stable leg is not 6 decimals, the other leg is not 18 decimals, or
    /// the oracle bounds are not a positive, non-empty range.
    pub fn new(
        token_a: Token,
        token_b: Token,
        stable_pair: bool,
        stable_asset: Address,
        oracle: Address,
        bounds: OracleBounds,
        heartbeat_secs: u64,
    ) -> Result<Self> {
        if token_a.address == token_b.address {
            return Err(invalid("token A and token B are the same asset"));
        }

        let stable_leg = if token_a.address == stable_asset {
            StableLeg::TokenA
        } else if token_b.address == stable_asset {
            StableLeg::TokenB
        } else {
            return Err(invalid(format!(
                "neither {} nor {} is the stable asset {}",
                token_a.symbol, token_b.symbol, stable_asset
            )));
        };

        let (stable, other) = match stable_leg {
            StableLeg::TokenA => (&token_a, &token_b),
            StableLeg::TokenB => (&token_b, &token_a),
        };
        if stable.decimals != STABLE_DECIMALS {
            return Err(invalid(format!(
                "stable leg {} has {} decimals, expected {}",
                stable.symbol, stable.decimals, STABLE_DECIMALS
            )));
        }
        if other.decimals != NON_STABLE_DECIMALS {
            return Err(invalid(format!(
                "non-stable leg {} has {} decimals, expected {}",
                other.symbol, other.decimals, NON_STABLE_DECIMALS
            )));
        }

        if bounds.lower <= 0 || bounds.lower >= bounds.upper {
            return Err(invalid(format!(
                "oracle bounds [{}, {}] must be positive and ascending",
                bounds.lower, bounds.upper
            )));
        }

        Ok(Self {
            token_a,
            token_b,
            stable_pair,
            oracle,
            bounds,
            heartbeat_secs,
            stable_leg,
        })
    }

    pub fn token_a(&self) -> &Token {
        &self.token_a
    }

    pub fn token_b(&self) -> &Token {
        &self.token_b
    }

    pub fn stable_pair(&self) -> bool {
        self.stable_pair
    }

    pub fn oracle(&self) -> Address {
        self.oracle
    }

    pub fn bounds(&self) -> OracleBounds {
        self.bounds
    }

    pub fn heartbeat_secs(&self) -> u64 {
        self.heartbeat_secs
    }

    pub fn stable_leg(&self) -> StableLeg {
        self.stable_leg
    }

    pub fn stable_token(&self) -> &Token {
        match self.stable_leg {
            StableLeg::TokenA => &self.token_a,
            StableLeg::TokenB => &self.token_b,
        }
    }
}

fn invalid(reason: impl Into<String>) -> VaultError {
    VaultError::InvalidPoolConfig(reason.into())
}
