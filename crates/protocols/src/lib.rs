//! External collaborators consumed by the ledger and vaults.
//!
//! Each collaborator is a trait plus an in-memory implementation:
//! - Price oracle (`latestRoundData`)
//! - Pool quoter (`quoteRemoveLiquidity`)
//! - Fungible token ledger (allowance-gated transfers)
//! - Staking venue (gauge custody and reward accrual)

/// Prelude module for convenient imports.
pub mod prelude;

/// Price oracle.
pub mod oracle;
/// AMM redemption quotes.
pub mod quoter;
/// Staking venue.
pub mod staking;
/// Fungible token ledger.
pub mod token;
