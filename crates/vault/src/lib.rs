//! Depositor vaults.
//!
//! A [`VaultController`] stakes one depositor's pooled tokens in a staking venue and
//! issues position records for them on the shared registry. The [`VaultFactory`]
//! deploys at most one controller per depositor and grants it the minter role.

/// Per-depositor vault controller.
pub mod controller;
/// Vault deployment.
pub mod factory;

pub use controller::{VaultContext, VaultController, Withdrawal};
pub use factory::VaultFactory;
