use crate::address::Address;
use crate::token::TokenAmount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a position record. Assigned monotonically from 1 and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u64);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A splittable claim on pooled liquidity held in custody elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub id: PositionId,
    pub owner: Address,
    /// Single-address delegate; cleared whenever ownership changes.
    pub approved: Option<Address>,
    /// Minter whose funding event this record descends from.
    pub issuer: Address,
    /// Pooled tokens represented, 18-decimal fixed point.
    pub pooled_amount: TokenAmount,
}

impl PositionRecord {
    pub fn new(id: PositionId, owner: Address, issuer: Address, pooled_amount: TokenAmount) -> Self {
        Self {
            id,
            owner,
            approved: None,
            issuer,
            pooled_amount,
        }
    }

    /// Child record carved out of this one; same owner and issuer, no approval.
    pub fn fork(&self, id: PositionId, pooled_amount: TokenAmount) -> Self {
        Self::new(id, self.owner, self.issuer, pooled_amount)
    }
}
