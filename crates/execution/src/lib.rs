//! Execution runtime for the receipt ledger.
//!
//! This crate wires the registry, factory, vaults and in-memory collaborators into a
//! single [`Chain`]:
//! - Mutating calls are serialized and applied all-or-nothing
//! - Events reach the log only when their call commits
//! - Reads share a lock and may run concurrently
//! - Time comes from a pluggable [`Clock`]

/// Prelude module for convenient imports.
pub mod prelude;

/// Chain state and call execution.
pub mod chain;
/// Time sources.
pub mod clock;
/// Transaction receipts.
pub mod receipt;

pub use chain::{Chain, ChainState, Genesis};
pub use clock::{Clock, ManualClock, SystemClock};
pub use receipt::{LoggedEvent, Receipt};
