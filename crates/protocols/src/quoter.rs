//! AMM redemption quotes.

use async_trait::async_trait;
use lp_receipts_domain::math::RedemptionQuote;
use lp_receipts_domain::math::fixed_point::mul_div;
use lp_receipts_domain::{Address, Result, TokenAmount, VaultError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Quotes how much of each pool token a quantity of pooled liquidity redeems for.
#[async_trait]
pub trait PoolQuoter: Send + Sync {
    /// Returns amounts in the order `(token_a, token_b)` as requested.
    async fn quote_remove_liquidity(
        &self,
        token_a: Address,
        token_b: Address,
        stable: bool,
        liquidity: TokenAmount,
    ) -> Result<RedemptionQuote>;
}

/// Reserve snapshot of a two-token pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    pub token0: Address,
    pub token1: Address,
    pub stable: bool,
    pub reserve0: TokenAmount,
    pub reserve1: TokenAmount,
    /// Outstanding pooled-token supply.
    pub total_supply: TokenAmount,
}

/// Quoter that redeems liquidity pro rata against a single pool's reserves.
///
/// formula: amount_i = liquidity * reserve_i / total_supply
#[derive(Debug, Clone)]
pub struct ReserveQuoter {
    reserves: Arc<RwLock<PoolReserves>>,
}

impl ReserveQuoter {
    #[must_use]
    pub fn new(reserves: PoolReserves) -> Self {
        Self {
            reserves: Arc::new(RwLock::new(reserves)),
        }
    }

    /// Replaces reserves and supply, e.g. after swaps moved the pool.
    pub async fn set_reserves(
        &self,
        reserve0: TokenAmount,
        reserve1: TokenAmount,
        total_supply: TokenAmount,
    ) {
        let mut reserves = self.reserves.write().await;
        reserves.reserve0 = reserve0;
        reserves.reserve1 = reserve1;
        reserves.total_supply = total_supply;
    }

    pub async fn reserves(&self) -> PoolReserves {
        *self.reserves.read().await
    }
}

#[async_trait]
impl PoolQuoter for ReserveQuoter {
    async fn quote_remove_liquidity(
        &self,
        token_a: Address,
        token_b: Address,
        stable: bool,
        liquidity: TokenAmount,
    ) -> Result<RedemptionQuote> {
        let pool = *self.reserves.read().await;

        let flipped = if (token_a, token_b) == (pool.token0, pool.token1) {
            false
        } else if (token_a, token_b) == (pool.token1, pool.token0) {
            true
        } else {
            return Err(VaultError::Collaborator(format!(
                "no pool for pair {}/{}",
                token_a, token_b
            )));
        };
        if stable != pool.stable {
            return Err(VaultError::Collaborator(format!(
                "no {} pool for pair {}/{}",
                if stable { "stable" } else { "volatile" },
                token_a,
                token_b
            )));
        }

        if pool.total_supply.is_zero() {
            return Ok(RedemptionQuote::new(TokenAmount::zero(), TokenAmount::zero()));
        }

        let amount0 = mul_div(liquidity.0, pool.reserve0.0, pool.total_supply.0)?;
        let amount1 = mul_div(liquidity.0, pool.reserve1.0, pool.total_supply.0)?;
        debug!(
            liquidity = %liquidity,
            amount0 = %amount0,
            amount1 = %amount1,
            "Quoted liquidity removal"
        );

        Ok(if flipped {
            RedemptionQuote::new(TokenAmount(amount1), TokenAmount(amount0))
        } else {
            RedemptionQuote::new(TokenAmount(amount0), TokenAmount(amount1))
        })
    }
}
