//! Price oracle collaborator.

use async_trait::async_trait;
use lp_receipts_domain::{OracleRound, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A feed reporting the latest `(price, updatedAt)` round.
///
/// Prices are signed 8-decimal integers; the ledger rejects non-positive values.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Returns the most recent round.
    async fn latest_round_data(&self) -> Result<OracleRound>;
}

/// Oracle whose round is set by hand. Used by tests and the demo runtime.
#[derive(Debug, Clone)]
pub struct ManualOracle {
    round: Arc<RwLock<OracleRound>>,
}

impl ManualOracle {
    /// Creates an oracle reporting `price` updated at `updated_at`.
    #[must_use]
    pub fn new(price: i128, updated_at: u64) -> Self {
        Self {
            round: Arc::new(RwLock::new(OracleRound::new(price, updated_at))),
        }
    }

    /// Sets the reported price, keeping the timestamp.
    pub async fn set_price(&self, price: i128) {
        let mut round = self.round.write().await;
        debug!(old = %round.price, new = %price, "Oracle price set");
        round.price = price;
    }

    /// Sets the round timestamp, keeping the price.
    pub async fn set_updated_at(&self, updated_at: u64) {
        self.round.write().await.updated_at = updated_at;
    }

    /// Replaces the whole round.
    pub async fn set_round(&self, price: i128, updated_at: u64) {
        *self.round.write().await = OracleRound::new(price, updated_at);
    }
}

#[async_trait]
impl PriceOracle for ManualOracle {
    async fn latest_round_data(&self) -> Result<OracleRound> {
        Ok(*self.round.read().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_oracle_updates() {
        let oracle = ManualOracle::new(110_000_000, 1_000);
        assert_eq!(
            oracle.latest_round_data().await.unwrap(),
            OracleRound::new(110_000_000, 1_000)
        );

        oracle.set_price(-1).await;
        oracle.set_updated_at(2_000).await;
        assert_eq!(
            oracle.latest_round_data().await.unwrap(),
            OracleRound::new(-1, 2_000)
        );

        let shared = oracle.clone();
        shared.set_round(100_000_000, 3_000).await;
        assert_eq!(oracle.latest_round_data().await.unwrap().updated_at, 3_000);
    }
}
