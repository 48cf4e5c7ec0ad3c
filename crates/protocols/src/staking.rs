//! Staking venue (gauge) collaborator.

use crate::token::TokenLedger;
use lp_receipts_domain::{Address, Result, TokenAmount, VaultError};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Custodian that accepts pooled tokens and accrues reward tokens per depositor.
///
/// Token movements go through the supplied `TokenLedger`; deposits pull from `account`
/// using an allowance granted to the venue's own address.
pub trait StakingVenue {
    /// Address the venue holds custody under.
    fn address(&self) -> Address;

    /// Token accepted for staking.
    fn staking_token(&self) -> Address;

    /// Staked balance of `account`.
    fn balance_of(&self, account: Address) -> TokenAmount;

    fn deposit(&mut self, tokens: &mut dyn TokenLedger, account: Address, amount: TokenAmount) -> Result<()>;

    fn withdraw(&mut self, tokens: &mut dyn TokenLedger, account: Address, amount: TokenAmount) -> Result<()>;

    /// Pays out everything `account` has accrued in each of `reward_tokens`.
    fn claim(&mut self, tokens: &mut dyn TokenLedger, account: Address, reward_tokens: &[Address]) -> Result<()>;

    /// Rewards accrued to `account` in `token`.
    ///
    /// # Errors
    /// `UntrackedRewardToken` for tokens the venue does not pay out.
    fn earned(&self, token: Address, account: Address) -> Result<TokenAmount>;
}

/// Gauge kept in memory. Rewards are credited explicitly with `notify_reward`.
#[derive(Debug, Clone)]
pub struct InMemoryGauge {
    address: Address,
    staking_token: Address,
    stakes: HashMap<Address, TokenAmount>,
    total_staked: TokenAmount,
    reward_tokens: BTreeSet<Address>,
    accrued: HashMap<(Address, Address), TokenAmount>,
}

impl InMemoryGauge {
    #[must_use]
    pub fn new(address: Address, staking_token: Address) -> Self {
        Self {
            address,
            staking_token,
            stakes: HashMap::new(),
            total_staked: TokenAmount::zero(),
            reward_tokens: BTreeSet::new(),
            accrued: HashMap::new(),
        }
    }

    /// Starts tracking `token` as a reward token. Returns false if already tracked.
    pub fn add_reward_token(&mut self, token: Address) -> bool {
        self.reward_tokens.insert(token)
    }

    pub fn reward_tokens(&self) -> impl Iterator<Item = &Address> {
        self.reward_tokens.iter()
    }

    pub fn total_staked(&self) -> TokenAmount {
        self.total_staked
    }

    /// Funds `amount` of `token` from `funder` and credits it to `account`.
    pub fn notify_reward(
        &mut self,
        tokens: &mut dyn TokenLedger,
        funder: Address,
        token: Address,
        account: Address,
        amount: TokenAmount,
    ) -> Result<()> {
        if !self.reward_tokens.contains(&token) {
            return Err(untracked(token));
        }
        tokens.transfer(token, funder, self.address, amount)?;
        let accrued = self.accrued_of(token, account).checked_add(amount)?;
        self.accrued.insert((token, account), accrued);
        debug!(token = %token, account = %account, amount = %amount, "Reward credited");
        Ok(())
    }

    fn accrued_of(&self, token: Address, account: Address) -> TokenAmount {
        self.accrued
            .get(&(token, account))
            .copied()
            .unwrap_or_default()
    }
}

impl StakingVenue for InMemoryGauge {
    fn address(&self) -> Address {
        self.address
    }

    fn staking_token(&self) -> Address {
        self.staking_token
    }

    fn balance_of(&self, account: Address) -> TokenAmount {
        self.stakes.get(&account).copied().unwrap_or_default()
    }

    fn deposit(&mut self, tokens: &mut dyn TokenLedger, account: Address, amount: TokenAmount) -> Result<()> {
        if amount.is_zero() {
            return Err(VaultError::ZeroAmount);
        }
        tokens.transfer_from(self.staking_token, self.address, account, self.address, amount)?;

        let stake = self.balance_of(account).checked_add(amount)?;
        self.total_staked = self.total_staked.checked_add(amount)?;
        self.stakes.insert(account, stake);
        info!(account = %account, amount = %amount, "Gauge deposit");
        Ok(())
    }

    fn withdraw(&mut self, tokens: &mut dyn TokenLedger, account: Address, amount: TokenAmount) -> Result<()> {
        let stake = self.balance_of(account);
        if stake < amount {
            return Err(VaultError::InsufficientBalance);
        }
        self.stakes.insert(account, stake.checked_sub(amount)?);
        self.total_staked = self.total_staked.checked_sub(amount)?;

        tokens.transfer(self.staking_token, self.address, account, amount)?;
        info!(account = %account, amount = %amount, "Gauge withdrawal");
        Ok(())
    }

    fn claim(&mut self, tokens: &mut dyn TokenLedger, account: Address, reward_tokens: &[Address]) -> Result<()> {
        for &token in reward_tokens {
            if !self.reward_tokens.contains(&token) {
                return Err(untracked(token));
            }
            let owed = self.accrued_of(token, account);
            if owed.is_zero() {
                continue;
            }
            self.accrued.insert((token, account), TokenAmount::zero());
            tokens.transfer(token, self.address, account, owed)?;
            debug!(token = %token, account = %account, amount = %owed, "Reward claimed");
        }
        Ok(())
    }

    fn earned(&self, token: Address, account: Address) -> Result<TokenAmount> {
        if !self.reward_tokens.contains(&token) {
            return Err(untracked(token));
        }
        Ok(self.accrued_of(token, account))
    }
}

fn untracked(token: Address) -> VaultError {
    VaultError::UntrackedRewardToken(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::InMemoryTokenLedger;

    const GAUGE: Address = Address::from_low_u64(0x6A);
    const LP: Address = Address::from_low_u64(0x1F);
    const VELO: Address = Address::from_low_u64(0x7E);
    const ALICE: Address = Address::from_low_u64(1);
    const TREASURY: Address = Address::from_low_u64(9);

    fn setup() -> (InMemoryTokenLedger, InMemoryGauge) {
        let mut tokens = InMemoryTokenLedger::new();
        tokens.mint(LP, ALICE, TokenAmount::from(1_000u64)).unwrap();
        tokens.mint(VELO, TREASURY, TokenAmount::from(500u64)).unwrap();
        let mut gauge = InMemoryGauge::new(GAUGE, LP);
        gauge.add_reward_token(VELO);
        (tokens, gauge)
    }

    #[test]
    fn test_deposit_requires_allowance() {
        let (mut tokens, mut gauge) = setup();
        assert_eq!(
            gauge.deposit(&mut tokens, ALICE, TokenAmount::from(10u64)),
            Err(VaultError::InsufficientAllowance)
        );

        tokens.approve(LP, ALICE, GAUGE, TokenAmount::from(10u64));
        gauge.deposit(&mut tokens, ALICE, TokenAmount::from(10u64)).unwrap();
        assert_eq!(gauge.balance_of(ALICE), TokenAmount::from(10u64));
        assert_eq!(tokens.balance_of(LP, GAUGE), TokenAmount::from(10u64));
        assert_eq!(gauge.total_staked(), TokenAmount::from(10u64));
    }

    #[test]
    fn test_withdraw_returns_stake() {
        let (mut tokens, mut gauge) = setup();
        tokens.approve(LP, ALICE, GAUGE, TokenAmount::from(10u64));
        gauge.deposit(&mut tokens, ALICE, TokenAmount::from(10u64)).unwrap();

        assert_eq!(
            gauge.withdraw(&mut tokens, ALICE, TokenAmount::from(11u64)),
            Err(VaultError::InsufficientBalance)
        );
        gauge.withdraw(&mut tokens, ALICE, TokenAmount::from(10u64)).unwrap();
        assert_eq!(tokens.balance_of(LP, ALICE), TokenAmount::from(1_000u64));
        assert!(gauge.balance_of(ALICE).is_zero());
    }

    #[test]
    fn test_rewards_accrue_and_claim() {
        let (mut tokens, mut gauge) = setup();
        gauge
            .notify_reward(&mut tokens, TREASURY, VELO, ALICE, TokenAmount::from(70u64))
            .unwrap();
        assert_eq!(gauge.earned(VELO, ALICE), Ok(TokenAmount::from(70u64)));

        gauge.claim(&mut tokens, ALICE, &[VELO]).unwrap();
        assert_eq!(tokens.balance_of(VELO, ALICE), TokenAmount::from(70u64));
        assert_eq!(gauge.earned(VELO, ALICE), Ok(TokenAmount::zero()));
    }

    #[test]
    fn test_untracked_reward_token_fails() {
        let (mut tokens, mut gauge) = setup();
        assert_eq!(gauge.earned(LP, ALICE), Err(VaultError::UntrackedRewardToken(LP)));
        assert_eq!(
            gauge.claim(&mut tokens, ALICE, &[LP]),
            Err(VaultError::UntrackedRewardToken(LP))
        );
    }
}
