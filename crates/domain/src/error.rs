use crate::address::Address;
use crate::position::PositionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The authority a caller was required to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authority {
    /// Member of the admin set.
    Admin,
    /// Member of the minter set.
    Minter,
    /// Owner of the record or an approved operator.
    OwnerOrApproved,
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authority::Admin => write!(f, "an admin"),
            Authority::Minter => write!(f, "a minter"),
            Authority::OwnerOrApproved => write!(f, "the owner or approved"),
        }
    }
}

/// Which oracle bound a price breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bound {
    /// Price above the configured ceiling.
    Upper,
    /// Price below the configured floor.
    Lower,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Upper => write!(f, "upper"),
            Bound::Lower => write!(f, "lower"),
        }
    }
}

/// Errors produced by the ledger, the valuation engine, vaults and the factory.
///
/// Every variant aborts the call that produced it; callers never observe partial effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// Caller lacks the required role or record ownership.
    #[error("access denied: caller is not {0}")]
    AccessDenied(Authority),
    /// Split fraction outside `[0, 1e18)`.
    #[error("split must be less than 100%")]
    InvalidSplitFraction,
    /// Operation referenced a record that does not exist.
    #[error("unknown position record {0}")]
    UnknownRecord(PositionId),
    /// Token pull exceeds the granted allowance.
    #[error("insufficient allowance")]
    InsufficientAllowance,
    /// Token transfer exceeds the sender's balance.
    #[error("insufficient balance")]
    InsufficientBalance,
    /// Reward token list was empty.
    #[error("empty tokens array")]
    EmptyInputArray,
    /// Oracle reported a zero or negative price.
    #[error("negative oracle price")]
    NegativeOraclePrice,
    /// Oracle price outside the configured bounds.
    #[error("{0} price bound breached")]
    OraclePriceOutOfBounds(Bound),
    /// Oracle round older than the heartbeat.
    #[error("stale price feed")]
    StaleOracleData,
    /// Caller already owns a vault.
    #[error("caller already has a vault")]
    AlreadyRegistered,
    /// Pool configuration rejected at construction.
    #[error("invalid pool config: {0}")]
    InvalidPoolConfig(String),
    /// Checked integer arithmetic overflowed.
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
    /// Zero amount where a positive amount is required.
    #[error("amount must be greater than zero")]
    ZeroAmount,
    /// Safe transfer recipient refused the record.
    #[error("recipient {0} does not accept position records")]
    UnsafeRecipient(Address),
    /// No vault is deployed at the given address.
    #[error("no vault deployed at {0}")]
    UnknownVault(Address),
    /// Staking venue does not pay rewards in this token.
    #[error("reward token {0} is not tracked by the gauge")]
    UntrackedRewardToken(Address),
    /// An external collaborator failed.
    #[error("collaborator call failed: {0}")]
    Collaborator(String),
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            VaultError::AccessDenied(Authority::Minter).to_string(),
            "access denied: caller is not a minter"
        );
        assert_eq!(
            VaultError::OraclePriceOutOfBounds(Bound::Upper).to_string(),
            "upper price bound breached"
        );
        assert_eq!(
            VaultError::UnknownRecord(PositionId(7)).to_string(),
            "unknown position record 7"
        );
        assert_eq!(
            VaultError::UntrackedRewardToken(Address::from_low_u64(0x1F)).to_string(),
            "reward token 0x000000000000000000000000000000000000001f is not tracked by the gauge"
        );
    }
}
