use crate::error::Result;
use crate::math::fixed_point::{ORACLE_BASE, STABLE_SCALE, mul_div};
use crate::pool::StableLeg;
use crate::token::TokenAmount;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Token amounts redeemable for a quantity of pooled liquidity, in pool token order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionQuote {
    pub amount_a: TokenAmount,
    pub amount_b: TokenAmount,
}

impl RedemptionQuote {
    pub fn new(amount_a: TokenAmount, amount_b: TokenAmount) -> Self {
        Self { amount_a, amount_b }
    }

    /// Returns `(stable, non_stable)` according to the configured leg.
    pub fn split_legs(&self, stable_leg: StableLeg) -> (TokenAmount, TokenAmount) {
        match stable_leg {
            StableLeg::TokenA => (self.amount_a, self.amount_b),
            StableLeg::TokenB => (self.amount_b, self.amount_a),
        }
    }
}

/// USD value of a redemption quote, 18-decimal fixed point.
///
/// formula: value = stable * 1e12 + non_stable * price / 1e8
///
/// `price` must already be validated (positive, within bounds, fresh). The stable leg
/// is 6 decimals and the non-stable leg is 18 decimals, both enforced by `PoolConfig`.
pub fn usd_value(quote: &RedemptionQuote, stable_leg: StableLeg, price: U256) -> Result<TokenAmount> {
    let (stable, non_stable) = quote.split_legs(stable_leg);

    let stable_value = mul_div(stable.0, STABLE_SCALE, U256::one())?;
    let non_stable_value = mul_div(non_stable.0, price, ORACLE_BASE)?;

    TokenAmount(stable_value).checked_add(TokenAmount(non_stable_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaultError;

    #[test]
    fn test_usd_value_stable_token_a() {
        // 0.5 USDC + 0.5 sUSD at $1.10
        let quote = RedemptionQuote::new(
            TokenAmount::from(500_000u64),
            TokenAmount::from(500_000_000_000_000_000u64),
        );
        let value = usd_value(&quote, StableLeg::TokenA, U256::from(110_000_000u64)).unwrap();
        // 0.5e18 + 0.55e18
        assert_eq!(value, TokenAmount::from(1_050_000_000_000_000_000u64));
    }

    #[test]
    fn test_usd_value_stable_token_b() {
        let quote = RedemptionQuote::new(
            TokenAmount::from(500_000_000_000_000_000u64),
            TokenAmount::from(500_000u64),
        );
        let value = usd_value(&quote, StableLeg::TokenB, U256::from(110_000_000u64)).unwrap();
        assert_eq!(value, TokenAmount::from(1_050_000_000_000_000_000u64));
    }

    #[test]
    fn test_usd_value_truncates_non_stable_leg() {
        // 3 wei * 0.5 = 1.5 -> 1
        let quote = RedemptionQuote::new(TokenAmount::zero(), TokenAmount::from(3u64));
        let value = usd_value(&quote, StableLeg::TokenA, U256::from(50_000_000u64)).unwrap();
        assert_eq!(value, TokenAmount::from(1u64));
    }

    #[test]
    fn test_usd_value_overflow_is_reported() {
        let quote = RedemptionQuote::new(TokenAmount(U256::MAX), TokenAmount::zero());
        assert_eq!(
            usd_value(&quote, StableLeg::TokenA, U256::one()),
            Err(VaultError::ArithmeticOverflow)
        );
    }
}
