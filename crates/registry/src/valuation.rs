//! USD valuation of pooled liquidity.
//!
//! A [`Valuer`] owns everything a valuation needs, so callers holding the registry
//! behind a lock can take one and release the lock before awaiting the quoter or oracle.

use crate::ledger::PositionRegistry;
use lp_receipts_domain::math::RedemptionQuote;
use lp_receipts_domain::math::valuation::usd_value;
use lp_receipts_domain::{PoolConfig, PositionId, Result, TokenAmount};
use lp_receipts_protocols::oracle::PriceOracle;
use lp_receipts_protocols::quoter::PoolQuoter;
use std::sync::Arc;
use tracing::{debug, warn};

/// Owned handle for pricing liquidity against one pool.
#[derive(Clone)]
pub struct Valuer {
    config: PoolConfig,
    quoter: Arc<dyn PoolQuoter>,
    oracle: Arc<dyn PriceOracle>,
}

impl Valuer {
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Quotes what `liquidity` pooled tokens redeem for, in `(token_a, token_b)` order.
    ///
    /// # Errors
    /// Propagates quoter failures.
    pub async fn view_quote_remove_liquidity(&self, liquidity: TokenAmount) -> Result<RedemptionQuote> {
        self.quoter
            .quote_remove_liquidity(
                self.config.token_a().address,
                self.config.token_b().address,
                self.config.stable_pair(),
                liquidity,
            )
            .await
    }

    /// USD value of `liquidity` pooled tokens at time `now`, 18-decimal fixed point.
    ///
    /// The stable leg is valued at $1 and the other leg at the validated oracle price.
    ///
    /// # Errors
    /// `NegativeOraclePrice`, `OraclePriceOutOfBounds`, `StaleOracleData`, arithmetic
    /// overflow, or collaborator failures.
    pub async fn price_liquidity(&self, liquidity: TokenAmount, now: u64) -> Result<TokenAmount> {
        let config = &self.config;
        let quote = self.view_quote_remove_liquidity(liquidity).await?;

        let round = self.oracle.latest_round_data().await?;
        let price = round
            .validate(&config.bounds(), config.heartbeat_secs(), now)
            .inspect_err(|e| {
                warn!(price = %round.price, updated_at = round.updated_at, now, error = %e, "Oracle round rejected");
            })?;

        let value = usd_value(&quote, config.stable_leg(), price)?;
        debug!(
            liquidity = %liquidity,
            amount_a = %quote.amount_a,
            amount_b = %quote.amount_b,
            price = %price,
            value = %value,
            "Priced liquidity"
        );
        Ok(value)
    }
}

impl PositionRegistry {
    /// Detached valuation handle sharing this registry's quoter and oracle.
    #[must_use]
    pub fn valuer(&self) -> Valuer {
        Valuer {
            config: self.config().clone(),
            quoter: Arc::clone(&self.quoter),
            oracle: Arc::clone(&self.oracle),
        }
    }

    /// See [`Valuer::view_quote_remove_liquidity`].
    ///
    /// # Errors
    /// Propagates quoter failures.
    pub async fn view_quote_remove_liquidity(&self, liquidity: TokenAmount) -> Result<RedemptionQuote> {
        self.valuer().view_quote_remove_liquidity(liquidity).await
    }

    /// See [`Valuer::price_liquidity`].
    ///
    /// # Errors
    /// Everything [`Valuer::price_liquidity`] returns.
    pub async fn price_liquidity(&self, liquidity: TokenAmount, now: u64) -> Result<TokenAmount> {
        self.valuer().price_liquidity(liquidity, now).await
    }

    /// USD value of the liquidity a record represents.
    ///
    /// # Errors
    /// `UnknownRecord`, plus everything [`Valuer::price_liquidity`] returns.
    pub async fn price_record(&self, id: PositionId, now: u64) -> Result<TokenAmount> {
        let amount = self.pooled_tokens(id)?;
        self.price_liquidity(amount, now).await
    }
}

#[cfg(test)]
mod tests {
    use crate::ledger::tests::{ADMIN, ALICE, MINTER, registry_with};
    use lp_receipts_domain::{Bound, PositionId, TokenAmount, VaultError};
    use lp_receipts_protocols::oracle::ManualOracle;

    const NOW: u64 = 1_700_000_000;

    // 1e15 of 2e15 pooled tokens redeems for 500k USDC and 500k sUSD
    fn half_pool() -> TokenAmount {
        TokenAmount::scaled(1, 15).unwrap()
    }

    #[tokio::test]
    async fn test_price_with_stable_token_a() {
        let registry = registry_with(true, ManualOracle::new(110_000_000, NOW - 60));
        let value = registry.price_liquidity(half_pool(), NOW).await.unwrap();
        // 500_000 + 500_000 * 1.10
        assert_eq!(value, TokenAmount::scaled(1_050_000, 18).unwrap());
    }

    #[tokio::test]
    async fn test_price_with_stable_token_b() {
        let registry = registry_with(false, ManualOracle::new(110_000_000, NOW - 60));
        let quote = registry
            .view_quote_remove_liquidity(half_pool())
            .await
            .unwrap();
        assert_eq!(quote.amount_a, TokenAmount::scaled(500_000, 18).unwrap());
        assert_eq!(quote.amount_b, TokenAmount::from(500_000_000_000u64));

        let value = registry.price_liquidity(half_pool(), NOW).await.unwrap();
        assert_eq!(value, TokenAmount::scaled(1_050_000, 18).unwrap());
    }

    #[tokio::test]
    async fn test_price_at_par_matches_decimal_parity() {
        let registry = registry_with(true, ManualOracle::new(100_000_000, NOW));
        let value = registry.price_liquidity(half_pool(), NOW).await.unwrap();
        // both legs are worth the same once the 6-decimal leg is scaled by 1e12
        assert_eq!(value, TokenAmount::scaled(1_000_000, 18).unwrap());
    }

    #[tokio::test]
    async fn test_price_rejects_bad_rounds() {
        let oracle = ManualOracle::new(100_000_000_000, NOW);
        let registry = registry_with(true, oracle.clone());
        assert_eq!(
            registry.price_liquidity(half_pool(), NOW).await,
            Err(VaultError::OraclePriceOutOfBounds(Bound::Upper))
        );

        oracle.set_price(100).await;
        assert_eq!(
            registry.price_liquidity(half_pool(), NOW).await,
            Err(VaultError::OraclePriceOutOfBounds(Bound::Lower))
        );

        oracle.set_price(-110_000_000).await;
        assert_eq!(
            registry.price_liquidity(half_pool(), NOW).await,
            Err(VaultError::NegativeOraclePrice)
        );

        oracle.set_round(110_000_000, NOW - 86_401).await;
        assert_eq!(
            registry.price_liquidity(half_pool(), NOW).await,
            Err(VaultError::StaleOracleData)
        );

        oracle.set_updated_at(NOW - 86_400).await;
        assert!(registry.price_liquidity(half_pool(), NOW).await.is_ok());
    }

    #[tokio::test]
    async fn test_price_record_uses_pooled_amount() {
        let mut registry = registry_with(true, ManualOracle::new(110_000_000, NOW));
        registry.add_minter(ADMIN, MINTER).unwrap();
        let id = registry.mint(MINTER, ALICE, half_pool()).unwrap();

        assert_eq!(
            registry.price_record(id, NOW).await,
            registry.price_liquidity(half_pool(), NOW).await
        );
        assert_eq!(
            registry.price_record(PositionId(42), NOW).await,
            Err(VaultError::UnknownRecord(PositionId(42)))
        );
    }

    #[tokio::test]
    async fn test_zero_liquidity_is_worth_zero() {
        let registry = registry_with(true, ManualOracle::new(110_000_000, NOW));
        assert_eq!(
            registry.price_liquidity(TokenAmount::zero(), NOW).await,
            Ok(TokenAmount::zero())
        );
    }

    #[tokio::test]
    async fn test_valuer_outlives_registry_changes() {
        let oracle = ManualOracle::new(110_000_000, NOW);
        let mut registry = registry_with(true, oracle.clone());
        let valuer = registry.valuer();

        registry.add_minter(ADMIN, MINTER).unwrap();
        registry.mint(MINTER, ALICE, half_pool()).unwrap();
        drop(registry);

        assert_eq!(
            valuer.price_liquidity(half_pool(), NOW).await,
            Ok(TokenAmount::scaled(1_050_000, 18).unwrap())
        );
        oracle.set_price(100_000_000).await;
        assert_eq!(
            valuer.price_liquidity(half_pool(), NOW).await,
            Ok(TokenAmount::scaled(1_000_000, 18).unwrap())
        );
    }
}
