//! Deployment configuration for the demo chain.

use anyhow::{Context, Result};
use lp_receipts_domain::{Address, OracleBounds, PoolConfig, Token, TokenAmount};
use lp_receipts_execution::Genesis;
use lp_receipts_protocols::quoter::PoolReserves;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable overriding the oracle heartbeat in seconds.
pub const HEARTBEAT_ENV: &str = "LP_RECEIPTS_HEARTBEAT_SECS";
/// Environment variable overriding the initial oracle price (8 decimals).
pub const ORACLE_PRICE_ENV: &str = "LP_RECEIPTS_ORACLE_PRICE";

// sUSD/USDC stable pool on Optimism
const OP_USDC: Address =
    Address::from_hex_literal("0x7F5c764cBc14f9669B88837ca1490cCa17c31607");
const OP_SUSD: Address =
    Address::from_hex_literal("0x8c6f28f2F1A3C87F0f938b96d27520d9751ec8d9");
const OP_SUSD_USD_FEED: Address =
    Address::from_hex_literal("0x7f99817d87baD03ea21E05112Ca799d715730efe");
const OP_SUSD_USDC_POOL: Address =
    Address::from_hex_literal("0xd16232ad60188B68076a235c65d692090caba155");
const OP_GAUGE: Address =
    Address::from_hex_literal("0xb03f52D2DB3e758DD49982Defd6AeEFEa9454e80");
const OP_VELO: Address =
    Address::from_hex_literal("0x3c8B650257cFb5f272f799F5e2b4e65093a11a05");

/// Pool, oracle and venue parameters for a deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Registry name.
    pub name: String,
    /// Registry symbol.
    pub symbol: String,
    /// First pool token.
    pub token_a: Token,
    /// Second pool token.
    pub token_b: Token,
    /// Address of the USD-stable leg.
    pub stable_asset: Address,
    /// Whether the pool uses the stable curve.
    pub stable_pair: bool,
    /// Price feed address.
    pub oracle: Address,
    /// Accepted oracle price range, 8 decimals.
    pub bounds: OracleBounds,
    /// Maximum oracle round age in seconds.
    pub heartbeat_secs: u64,
    /// Price the demo oracle starts at, 8 decimals.
    pub oracle_price: i128,
    /// Pooled token (the AMM pair itself).
    pub staking_token: Address,
    /// Gauge custodying staked pooled tokens.
    pub gauge: Address,
    /// Tokens the gauge pays rewards in.
    pub reward_tokens: Vec<Address>,
    pub factory: Address,
    pub registry: Address,
    /// Reserve of token A, whole tokens.
    pub reserve_a: Decimal,
    /// Reserve of token B, whole tokens.
    pub reserve_b: Decimal,
    /// Outstanding pooled-token supply, whole tokens.
    pub lp_supply: Decimal,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            name: "Deposit_Receipt".to_string(),
            symbol: "DR".to_string(),
            token_a: Token::new(
                OP_USDC,
                "USDC",
                6,
                "USD Coin",
            ),
            token_b: Token::new(
                OP_SUSD,
                "sUSD",
                18,
                "Synth sUSD",
            ),
            stable_asset: OP_USDC,
            stable_pair: true,
            oracle: OP_SUSD_USD_FEED,
            bounds: OracleBounds::new(50_000_000, 200_000_000),
            heartbeat_secs: 24 * 60 * 60,
            oracle_price: 100_000_000,
            staking_token: OP_SUSD_USDC_POOL,
            gauge: OP_GAUGE,
            reward_tokens: vec![OP_VELO],
            factory: Address::from_low_u64(0xFAC7),
            registry: Address::from_low_u64(0xDEC0),
            reserve_a: Decimal::new(5_000_000, 0),
            reserve_b: Decimal::new(5_000_000, 0),
            lp_supply: Decimal::new(5, 0),
        }
    }
}

impl DeploymentConfig {
    /// Reads a JSON config from `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(path = %path.display(), "Loaded deployment config");
        Ok(config)
    }

    /// Loads from `path` if given, otherwise the built-in defaults, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Applies `LP_RECEIPTS_*` overrides present in the environment.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(raw) = env::var(HEARTBEAT_ENV) {
            self.heartbeat_secs = raw
                .parse()
                .with_context(|| format!("{HEARTBEAT_ENV}={raw} is not a number of seconds"))?;
            debug!(heartbeat_secs = self.heartbeat_secs, "Heartbeat overridden");
        }
        if let Ok(raw) = env::var(ORACLE_PRICE_ENV) {
            self.oracle_price = raw
                .parse()
                .with_context(|| format!("{ORACLE_PRICE_ENV}={raw} is not an integer price"))?;
            debug!(oracle_price = %self.oracle_price, "Oracle price overridden");
        }
        Ok(())
    }

    /// Validated pool configuration.
    pub fn pool_config(&self) -> Result<PoolConfig> {
        PoolConfig::new(
            self.token_a.clone(),
            self.token_b.clone(),
            self.stable_pair,
            self.stable_asset,
            self.oracle,
            self.bounds,
            self.heartbeat_secs,
        )
        .context("invalid pool configuration")
    }

    pub fn genesis(&self) -> Result<Genesis> {
        Ok(Genesis {
            factory: self.factory,
            registry: self.registry,
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            pool: self.pool_config()?,
            staking_token: self.staking_token,
            gauge: self.gauge,
            reward_tokens: self.reward_tokens.clone(),
        })
    }

    /// Reserves for the in-memory quoter, converted to raw units.
    pub fn reserves(&self) -> Result<PoolReserves> {
        let raw = |value: Decimal, decimals: u8, what: &str| {
            TokenAmount::from_decimal(value, decimals)
                .with_context(|| format!("{what} {value} cannot be represented"))
        };
        Ok(PoolReserves {
            token0: self.token_a.address,
            token1: self.token_b.address,
            stable: self.stable_pair,
            reserve0: raw(self.reserve_a, self.token_a.decimals, "reserve_a")?,
            reserve1: raw(self.reserve_b, self.token_b.decimals, "reserve_b")?,
            total_supply: raw(self.lp_supply, 18, "lp_supply")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_receipts_domain::StableLeg;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = DeploymentConfig::default();
        let pool = config.pool_config().unwrap();
        assert_eq!(pool.stable_leg(), StableLeg::TokenA);
        assert_eq!(pool.stable_token().symbol, "USDC");
        assert_eq!(
            config.token_a.address.to_string(),
            "0x7f5c764cbc14f9669b88837ca1490cca17c31607"
        );

        for address in [
            config.token_b.address,
            config.oracle,
            config.staking_token,
            config.gauge,
            config.reward_tokens[0],
        ] {
            assert!(!address.is_zero());
        }

        let reserves = config.reserves().unwrap();
        assert_eq!(reserves.reserve0, TokenAmount::scaled(5_000_000, 6).unwrap());
        assert_eq!(reserves.reserve1, TokenAmount::scaled(5_000_000, 18).unwrap());
        assert_eq!(reserves.total_supply.to_decimal(18), Some(dec!(5)));
    }

    #[test]
    fn test_round_trips_through_file() {
        let mut config = DeploymentConfig::default();
        config.heartbeat_secs = 3_600;
        config.reserve_b = dec!(1234.5);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string_pretty(&config).unwrap().as_bytes())
            .unwrap();

        let loaded = DeploymentConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_bad_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = DeploymentConfig::from_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }

    #[test]
    fn test_invalid_pool_is_rejected() {
        let mut config = DeploymentConfig::default();
        config.token_b.decimals = 6;
        assert!(config.pool_config().is_err());

        let mut config = DeploymentConfig::default();
        config.stable_asset = Address::from_low_u64(1);
        assert!(config.genesis().is_err());
    }
}
