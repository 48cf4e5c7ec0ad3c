//! Fungible token ledger.

use lp_receipts_domain::{Address, Result, TokenAmount, VaultError};
use primitive_types::U256;
use std::collections::HashMap;
use tracing::debug;

/// Allowance-gated fungible token operations, keyed by token address.
pub trait TokenLedger {
    fn balance_of(&self, token: Address, account: Address) -> TokenAmount;

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> TokenAmount;

    /// Sets `spender`'s allowance over `owner`'s balance.
    fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: TokenAmount);

    /// Moves `amount` from `from` to `to`.
    ///
    /// # Errors
    /// `InsufficientBalance` if `from` holds less than `amount`.
    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: TokenAmount) -> Result<()>;

    /// Moves `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    ///
    /// # Errors
    /// `InsufficientAllowance` is checked before `InsufficientBalance`.
    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<()>;
}

/// Multi-token balance and allowance book held in memory.
///
/// An allowance of `U256::MAX` is treated as unlimited and never decremented.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenLedger {
    balances: HashMap<(Address, Address), TokenAmount>,
    allowances: HashMap<(Address, Address, Address), TokenAmount>,
    supplies: HashMap<Address, TokenAmount>,
}

impl InMemoryTokenLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `amount` new units of `token` for `to`.
    pub fn mint(&mut self, token: Address, to: Address, amount: TokenAmount) -> Result<()> {
        let supply = self.total_supply(token).checked_add(amount)?;
        let balance = self.balance_of(token, to).checked_add(amount)?;
        self.supplies.insert(token, supply);
        self.balances.insert((token, to), balance);
        debug!(token = %token, to = %to, amount = %amount, "Minted tokens");
        Ok(())
    }

    pub fn total_supply(&self, token: Address) -> TokenAmount {
        self.supplies.get(&token).copied().unwrap_or_default()
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn balance_of(&self, token: Address, account: Address) -> TokenAmount {
        self.balances
            .get(&(token, account))
            .copied()
            .unwrap_or_default()
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> TokenAmount {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: TokenAmount) {
        self.allowances.insert((token, owner, spender), amount);
    }

    fn transfer(&mut self, token: Address, from: Address, to: Address, amount: TokenAmount) -> Result<()> {
        let from_balance = self.balance_of(token, from);
        if from_balance < amount {
            return Err(VaultError::InsufficientBalance);
        }
        if from == to || amount.is_zero() {
            return Ok(());
        }
        let to_balance = self.balance_of(token, to).checked_add(amount)?;
        self.balances
            .insert((token, from), from_balance.checked_sub(amount)?);
        self.balances.insert((token, to), to_balance);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<()> {
        let allowance = self.allowance(token, from, spender);
        if allowance < amount {
            return Err(VaultError::InsufficientAllowance);
        }
        self.transfer(token, from, to, amount)?;
        if allowance.0 != U256::MAX {
            self.allowances
                .insert((token, from, spender), allowance.checked_sub(amount)?);
        }
        Ok(())
    }
}
