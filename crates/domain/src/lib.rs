//! Domain types for pooled-liquidity deposit receipts.
//!
//! This crate holds the value types shared by every other crate in the workspace:
//! - Addresses and token amounts
//! - Position records and their identifiers
//! - Pool configuration and oracle rounds
//! - Role sets for admin/minter authorization
//! - Fixed-point math used by splitting and valuation
//! - The error taxonomy and ledger events

/// Account and contract addresses.
pub mod address;
/// Error taxonomy.
pub mod error;
/// Events emitted by the ledger, vaults and factory.
pub mod events;
/// Fixed-point and valuation math.
pub mod math;
/// Oracle rounds and their validation.
pub mod oracle;
/// Pool configuration.
pub mod pool;
/// Position records.
pub mod position;
/// Role-based authorization.
pub mod roles;
/// Tokens and token amounts.
pub mod token;

pub use address::Address;
pub use error::{Authority, Bound, Result, VaultError};
pub use events::{EventBuffer, LedgerEvent};
pub use oracle::OracleRound;
pub use pool::{OracleBounds, PoolConfig, StableLeg};
pub use position::{PositionId, PositionRecord};
pub use roles::{Role, RoleSet};
pub use token::{Token, TokenAmount};
