//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use lp_receipts_protocols::prelude::*;
//! ```

pub use crate::oracle::{ManualOracle, PriceOracle};
pub use crate::quoter::{PoolQuoter, PoolReserves, ReserveQuoter};
pub use crate::staking::{InMemoryGauge, StakingVenue};
pub use crate::token::{InMemoryTokenLedger, TokenLedger};
