use crate::address::Address;
use crate::error::{Authority, Result, VaultError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ledger roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May grant the minter role.
    Admin,
    /// May mint and burn position records.
    Minter,
}

impl From<Role> for Authority {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Authority::Admin,
            Role::Minter => Authority::Minter,
        }
    }
}

/// Independent admin and minter sets. Holding one role never implies the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    admins: HashSet<Address>,
    minters: HashSet<Address>,
}

impl RoleSet {
    /// Creates a role set with `deployer` as its only admin.
    pub fn with_admin(deployer: Address) -> Self {
        let mut admins = HashSet::new();
        admins.insert(deployer);
        Self {
            admins,
            minters: HashSet::new(),
        }
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        match role {
            Role::Admin => self.admins.contains(account),
            Role::Minter => self.minters.contains(account),
        }
    }

    /// Fails with `AccessDenied` unless `account` holds `role`.
    pub fn require(&self, role: Role, account: &Address) -> Result<()> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(VaultError::AccessDenied(role.into()))
        }
    }

    /// Adds `minter` to the minter set. Returns false if it was already present.
    pub fn grant_minter(&mut self, admin: &Address, minter: Address) -> Result<bool> {
        self.require(Role::Admin, admin)?;
        Ok(self.minters.insert(minter))
    }

    pub fn minters(&self) -> impl Iterator<Item = &Address> {
        self.minters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployer_is_admin_not_minter() {
        let deployer = Address::from_low_u64(1);
        let roles = RoleSet::with_admin(deployer);
        assert!(roles.has_role(Role::Admin, &deployer));
        assert!(!roles.has_role(Role::Minter, &deployer));
        assert_eq!(
            roles.require(Role::Minter, &deployer),
            Err(VaultError::AccessDenied(Authority::Minter))
        );
    }

    #[test]
    fn test_grant_minter_requires_admin_and_is_idempotent() {
        let deployer = Address::from_low_u64(1);
        let bob = Address::from_low_u64(2);
        let mut roles = RoleSet::with_admin(deployer);

        assert_eq!(
            roles.grant_minter(&bob, bob),
            Err(VaultError::AccessDenied(Authority::Admin))
        );
        assert_eq!(roles.grant_minter(&deployer, bob), Ok(true));
        assert_eq!(roles.grant_minter(&deployer, bob), Ok(false));
        assert_eq!(roles.minters().count(), 1);
    }
}
