//! Position ledger and valuation engine.
//!
//! The [`PositionRegistry`] tracks splittable position records with ownership-token
//! semantics, gates minting behind an admin/minter role set, and values pooled
//! liquidity in USD from an AMM redemption quote and an oracle price.

mod ledger;
mod receiver;
mod valuation;

pub use ledger::PositionRegistry;
pub use receiver::RecordReceiver;
pub use valuation::Valuer;
