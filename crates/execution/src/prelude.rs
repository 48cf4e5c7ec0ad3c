//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use lp_receipts_execution::prelude::*;
//! ```

pub use crate::chain::{Chain, ChainState, Genesis};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::receipt::{LoggedEvent, Receipt};

pub use lp_receipts_domain::{
    Address, Authority, LedgerEvent, OracleBounds, PoolConfig, PositionId, Role, Token, TokenAmount,
    VaultError,
};
pub use lp_receipts_protocols::prelude::*;
pub use lp_receipts_vault::Withdrawal;
