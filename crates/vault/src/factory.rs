//! Vault deployment, one per depositor.

use crate::controller::VaultController;
use lp_receipts_domain::{Address, EventBuffer, LedgerEvent, Result, VaultError};
use lp_receipts_registry::PositionRegistry;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Deploys vault controllers and tracks which depositor owns which vault.
///
/// The factory deploys the shared registry and is therefore its admin; each new vault
/// is granted the minter role on it.
#[derive(Debug, Clone)]
pub struct VaultFactory {
    address: Address,
    registry: Address,
    staking_token: Address,
    venue: Address,
    vaults: BTreeMap<Address, Address>,
    nonce: u64,
    events: EventBuffer,
}

impl VaultFactory {
    #[must_use]
    pub fn new(address: Address, registry: Address, staking_token: Address, venue: Address) -> Self {
        Self {
            address,
            registry,
            staking_token,
            venue,
            vaults: BTreeMap::new(),
            nonce: 0,
            events: EventBuffer::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Deploys a vault for `caller` and makes it a minter on `registry`.
    ///
    /// # Errors
    /// `AlreadyRegistered` if `caller` already has a vault; `AccessDenied(Admin)` if the
    /// factory is not an admin of `registry`.
    pub fn make_new_depositor(
        &mut self,
        caller: Address,
        registry: &mut PositionRegistry,
    ) -> Result<VaultController> {
        if self.vaults.contains_key(&caller) {
            warn!(owner = %caller, "Depositor already has a vault");
            return Err(VaultError::AlreadyRegistered);
        }

        let nonce = self.nonce + 1;
        let vault = Address::derive(&self.address, nonce);
        registry.add_minter(self.address, vault)?;

        self.nonce = nonce;
        self.vaults.insert(caller, vault);
        self.events.emit(LedgerEvent::VaultCreated {
            owner: caller,
            vault,
        });
        info!(owner = %caller, vault = %vault, "Vault created");

        Ok(VaultController::new(
            vault,
            caller,
            self.registry,
            self.staking_token,
            self.venue,
        ))
    }

    /// Vault deployed for `owner`, if any.
    pub fn vault_of(&self, owner: &Address) -> Option<Address> {
        self.vaults.get(owner).copied()
    }

    pub fn vault_count(&self) -> usize {
        self.vaults.len()
    }

    /// Drains events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        self.events.drain()
    }
}
