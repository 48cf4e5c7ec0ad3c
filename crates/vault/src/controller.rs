//! Per-depositor vault controller.

use lp_receipts_domain::{Address, Authority, PositionId, Result, TokenAmount, VaultError};
use lp_receipts_protocols::staking::StakingVenue;
use lp_receipts_protocols::token::TokenLedger;
use lp_receipts_registry::{PositionRegistry, RecordReceiver};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Mutable state a vault call operates on.
pub struct VaultContext<'a> {
    pub registry: &'a mut PositionRegistry,
    pub tokens: &'a mut dyn TokenLedger,
    pub venue: &'a mut dyn StakingVenue,
}

/// Outcome of a gauge withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Record that was burned.
    pub position: PositionId,
    /// Pooled tokens returned to the owner.
    pub principal: TokenAmount,
    /// Reward tokens forwarded to the owner, with amounts.
    pub rewards: Vec<(Address, TokenAmount)>,
}

/// Stakes one depositor's pooled tokens and issues position records against them.
///
/// The vault holds the minter role on the shared registry. It never keeps tokens between
/// calls: principal sits in the staking venue and harvested rewards are forwarded at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultController {
    address: Address,
    owner: Address,
    registry: Address,
    staking_token: Address,
    venue: Address,
}

impl VaultController {
    pub fn new(
        address: Address,
        owner: Address,
        registry: Address,
        staking_token: Address,
        venue: Address,
    ) -> Self {
        Self {
            address,
            owner,
            registry,
            staking_token,
            venue,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn registry(&self) -> Address {
        self.registry
    }

    pub fn staking_token(&self) -> Address {
        self.staking_token
    }

    pub fn venue(&self) -> Address {
        self.venue
    }

    /// Pulls `amount` pooled tokens from the owner, mints a record for them and stakes
    /// them in the venue.
    ///
    /// The owner must have approved the vault for `amount` beforehand.
    ///
    /// # Errors
    /// `AccessDenied(OwnerOrApproved)` for anyone but the owner, `ZeroAmount`,
    /// `InsufficientAllowance`, `InsufficientBalance`, or a registry/venue failure.
    pub fn deposit_to_gauge(
        &self,
        ctx: VaultContext<'_>,
        caller: Address,
        amount: TokenAmount,
    ) -> Result<PositionId> {
        self.require_owner(caller)?;
        if amount.is_zero() {
            return Err(VaultError::ZeroAmount);
        }
        if ctx.tokens.allowance(self.staking_token, self.owner, self.address) < amount {
            return Err(VaultError::InsufficientAllowance);
        }
        if ctx.tokens.balance_of(self.staking_token, self.owner) < amount {
            return Err(VaultError::InsufficientBalance);
        }

        let id = ctx.registry.mint(self.address, self.owner, amount)?;

        ctx.tokens
            .transfer_from(self.staking_token, self.address, self.owner, self.address, amount)?;
        ctx.tokens
            .approve(self.staking_token, self.address, ctx.venue.address(), amount);
        ctx.venue.deposit(ctx.tokens, self.address, amount)?;

        info!(vault = %self.address, position = %id, amount = %amount, "Deposited to gauge");
        Ok(id)
    }

    /// Burns record `id`, unstakes its pooled tokens and returns them to the owner along
    /// with everything harvested in `reward_tokens`.
    ///
    /// # Errors
    /// `AccessDenied(OwnerOrApproved)` unless the owner may spend `id`,
    /// `AccessDenied(Minter)` if the record was issued by another vault, `UnknownRecord`,
    /// or a venue/token failure.
    pub fn withdraw_from_gauge(
        &self,
        ctx: VaultContext<'_>,
        caller: Address,
        id: PositionId,
        reward_tokens: &[Address],
    ) -> Result<Withdrawal> {
        self.require_owner(caller)?;
        if !ctx.registry.is_approved_or_owner(&caller, id)? {
            warn!(vault = %self.address, position = %id, "Withdrawal of foreign position rejected");
            return Err(VaultError::AccessDenied(Authority::OwnerOrApproved));
        }

        let record = ctx.registry.burn(self.address, id)?;
        let principal = record.pooled_amount;

        ctx.venue.withdraw(ctx.tokens, self.address, principal)?;
        if !reward_tokens.is_empty() {
            ctx.venue.claim(ctx.tokens, self.address, reward_tokens)?;
        }

        ctx.tokens
            .transfer(self.staking_token, self.address, self.owner, principal)?;
        let rewards = self.forward_rewards(ctx.tokens, reward_tokens)?;

        info!(
            vault = %self.address,
            position = %id,
            principal = %principal,
            reward_tokens = rewards.len(),
            "Withdrew from gauge"
        );
        Ok(Withdrawal {
            position: id,
            principal,
            rewards,
        })
    }

    /// Harvests `reward_tokens` and forwards the vault's full balance of each to the owner.
    ///
    /// # Errors
    /// `AccessDenied(OwnerOrApproved)` for anyone but the owner, `EmptyInputArray`, or a
    /// venue/token failure.
    pub fn claim_rewards(
        &self,
        ctx: VaultContext<'_>,
        caller: Address,
        reward_tokens: &[Address],
    ) -> Result<Vec<(Address, TokenAmount)>> {
        self.require_owner(caller)?;
        if reward_tokens.is_empty() {
            return Err(VaultError::EmptyInputArray);
        }

        ctx.venue.claim(ctx.tokens, self.address, reward_tokens)?;
        let rewards = self.forward_rewards(ctx.tokens, reward_tokens)?;

        info!(vault = %self.address, reward_tokens = rewards.len(), "Rewards claimed");
        Ok(rewards)
    }

    /// Rewards the venue has accrued to this vault in `token`. Untracked tokens report zero.
    ///
    /// # Errors
    /// Any other venue failure.
    pub fn view_pending_rewards(&self, venue: &dyn StakingVenue, token: Address) -> Result<TokenAmount> {
        match venue.earned(token, self.address) {
            Err(VaultError::UntrackedRewardToken(_)) => {
                debug!(vault = %self.address, token = %token, "Token not rewarded by venue");
                Ok(TokenAmount::zero())
            }
            other => other,
        }
    }

    /// Pooled tokens this vault currently has staked.
    pub fn staked(&self, venue: &dyn StakingVenue) -> TokenAmount {
        venue.balance_of(self.address)
    }

    fn forward_rewards(
        &self,
        tokens: &mut dyn TokenLedger,
        reward_tokens: &[Address],
    ) -> Result<Vec<(Address, TokenAmount)>> {
        let mut forwarded: Vec<(Address, TokenAmount)> = Vec::with_capacity(reward_tokens.len());
        for &token in reward_tokens {
            if forwarded.iter().any(|(t, _)| *t == token) {
                continue;
            }
            let balance = tokens.balance_of(token, self.address);
            tokens.transfer(token, self.address, self.owner, balance)?;
            debug!(vault = %self.address, token = %token, amount = %balance, "Reward forwarded");
            forwarded.push((token, balance));
        }
        Ok(forwarded)
    }

    fn require_owner(&self, caller: Address) -> Result<()> {
        if caller == self.owner {
            Ok(())
        } else {
            warn!(vault = %self.address, caller = %caller, "Call by non-owner rejected");
            Err(VaultError::AccessDenied(Authority::OwnerOrApproved))
        }
    }
}

/// Vaults never take custody of position records.
impl RecordReceiver for VaultController {
    fn on_record_received(
        &self,
        _registry: &PositionRegistry,
        _operator: Address,
        _from: Address,
        _id: PositionId,
    ) -> bool {
        false
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lp_receipts_domain::{OracleBounds, PoolConfig, Token};
    use lp_receipts_protocols::prelude::*;
    use std::sync::Arc;

    pub(crate) const ADMIN: Address = Address::from_low_u64(0xAD);
    pub(crate) const ALICE: Address = Address::from_low_u64(0xA11CE);
    pub(crate) const BOB: Address = Address::from_low_u64(0xB0B);
    pub(crate) const VAULT: Address = Address::from_low_u64(0x7A);
    pub(crate) const REGISTRY: Address = Address::from_low_u64(0x4E);
    pub(crate) const LP: Address = Address::from_low_u64(0x1F);
    pub(crate) const GAUGE: Address = Address::from_low_u64(0x6A);
    pub(crate) const VELO: Address = Address::from_low_u64(0x7E);
    pub(crate) const TREASURY: Address = Address::from_low_u64(0x7E5);
    const USDC: Address = Address::from_low_u64(0x05DC);
    const SUSD: Address = Address::from_low_u64(0x5D);

    pub(crate) struct Fixture {
        pub registry: PositionRegistry,
        pub tokens: InMemoryTokenLedger,
        pub gauge: InMemoryGauge,
    }

    impl Fixture {
        pub fn ctx(&mut self) -> VaultContext<'_> {
            VaultContext {
                registry: &mut self.registry,
                tokens: &mut self.tokens,
                venue: &mut self.gauge,
            }
        }
    }

    pub(crate) fn registry() -> PositionRegistry {
        registry_deployed_by(ADMIN)
    }

    pub(crate) fn registry_deployed_by(deployer: Address) -> PositionRegistry {
        let config = PoolConfig::new(
            Token::new(USDC, "USDC", 6, "USD Coin"),
            Token::new(SUSD, "sUSD", 18, "Synth sUSD"),
            true,
            USDC,
            Address::from_low_u64(0x0AC1E),
            OracleBounds::new(50_000_000, 200_000_000),
            86_400,
        )
        .unwrap();
        let quoter = ReserveQuoter::new(PoolReserves {
            token0: USDC,
            token1: SUSD,
            stable: true,
            reserve0: TokenAmount::zero(),
            reserve1: TokenAmount::zero(),
            total_supply: TokenAmount::zero(),
        });
        PositionRegistry::new(
            deployer,
            "Deposit_Receipt",
            "DR",
            config,
            Arc::new(quoter),
            Arc::new(ManualOracle::new(100_000_000, 0)),
        )
    }

    pub(crate) fn fixture() -> (Fixture, VaultController) {
        let mut registry = registry();
        registry.add_minter(ADMIN, VAULT).unwrap();

        let mut tokens = InMemoryTokenLedger::new();
        tokens.mint(LP, ALICE, TokenAmount::scaled(1_000, 18).unwrap()).unwrap();
        tokens.mint(VELO, TREASURY, TokenAmount::scaled(1_000, 18).unwrap()).unwrap();

        let mut gauge = InMemoryGauge::new(GAUGE, LP);
        gauge.add_reward_token(VELO);

        let vault = VaultController::new(VAULT, ALICE, REGISTRY, LP, GAUGE);
        (
            Fixture {
                registry,
                tokens,
                gauge,
            },
            vault,
        )
    }

    fn wad(units: u64) -> TokenAmount {
        TokenAmount::scaled(units, 18).unwrap()
    }

    fn deposit(fx: &mut Fixture, vault: &VaultController, amount: TokenAmount) -> PositionId {
        fx.tokens.approve(LP, ALICE, VAULT, amount);
        vault.deposit_to_gauge(fx.ctx(), ALICE, amount).unwrap()
    }

    #[test]
    fn test_deposit_mints_and_stakes() {
        let (mut fx, vault) = fixture();
        let id = deposit(&mut fx, &vault, wad(100));

        assert_eq!(fx.registry.owner_of(id), Ok(ALICE));
        assert_eq!(fx.registry.pooled_tokens(id), Ok(wad(100)));
        assert_eq!(fx.registry.record(id).unwrap().issuer, VAULT);
        assert_eq!(vault.staked(&fx.gauge), wad(100));
        assert_eq!(fx.tokens.balance_of(LP, ALICE), wad(900));
        assert!(fx.tokens.balance_of(LP, VAULT).is_zero());
    }

    #[test]
    fn test_deposit_rejections() {
        let (mut fx, vault) = fixture();
        assert_eq!(
            vault.deposit_to_gauge(fx.ctx(), BOB, wad(1)),
            Err(VaultError::AccessDenied(Authority::OwnerOrApproved))
        );
        assert_eq!(
            vault.deposit_to_gauge(fx.ctx(), ALICE, TokenAmount::zero()),
            Err(VaultError::ZeroAmount)
        );
        assert_eq!(
            vault.deposit_to_gauge(fx.ctx(), ALICE, wad(1)),
            Err(VaultError::InsufficientAllowance)
        );

        fx.tokens.approve(LP, ALICE, VAULT, wad(5_000));
        assert_eq!(
            vault.deposit_to_gauge(fx.ctx(), ALICE, wad(5_000)),
            Err(VaultError::InsufficientBalance)
        );
        assert_eq!(fx.registry.total_records(), 0);
    }

    #[test]
    fn test_withdraw_returns_principal_and_rewards() {
        let (mut fx, vault) = fixture();
        let id = deposit(&mut fx, &vault, wad(100));
        fx.gauge
            .notify_reward(&mut fx.tokens, TREASURY, VELO, VAULT, wad(7))
            .unwrap();

        let withdrawal = vault
            .withdraw_from_gauge(fx.ctx(), ALICE, id, &[VELO])
            .unwrap();
        assert_eq!(withdrawal.principal, wad(100));
        assert_eq!(withdrawal.rewards, vec![(VELO, wad(7))]);

        assert_eq!(fx.tokens.balance_of(LP, ALICE), wad(1_000));
        assert_eq!(fx.tokens.balance_of(VELO, ALICE), wad(7));
        assert!(fx.tokens.balance_of(VELO, VAULT).is_zero());
        assert!(vault.staked(&fx.gauge).is_zero());
        assert_eq!(fx.registry.owner_of(id), Err(VaultError::UnknownRecord(id)));
    }

    #[test]
    fn test_withdraw_after_split_releases_only_the_part() {
        let (mut fx, vault) = fixture();
        let id = deposit(&mut fx, &vault, wad(100));
        let child = fx
            .registry
            .split(ALICE, id, TokenAmount::scaled(25, 16).unwrap().0)
            .unwrap();

        let withdrawal = vault.withdraw_from_gauge(fx.ctx(), ALICE, child, &[]).unwrap();
        assert_eq!(withdrawal.principal, wad(25));
        assert!(withdrawal.rewards.is_empty());
        assert_eq!(vault.staked(&fx.gauge), wad(75));
        assert_eq!(fx.registry.pooled_tokens(id), Ok(wad(75)));
    }

    #[test]
    fn test_withdraw_of_transferred_record_rejected() {
        let (mut fx, vault) = fixture();
        let id = deposit(&mut fx, &vault, wad(10));
        fx.registry.transfer_from(ALICE, ALICE, BOB, id).unwrap();

        assert_eq!(
            vault.withdraw_from_gauge(fx.ctx(), ALICE, id, &[]),
            Err(VaultError::AccessDenied(Authority::OwnerOrApproved))
        );
        assert_eq!(
            vault.withdraw_from_gauge(fx.ctx(), BOB, id, &[]),
            Err(VaultError::AccessDenied(Authority::OwnerOrApproved))
        );
        assert_eq!(
            vault.withdraw_from_gauge(fx.ctx(), ALICE, PositionId(9), &[]),
            Err(VaultError::UnknownRecord(PositionId(9)))
        );
    }

    #[test]
    fn test_claim_forwards_everything() {
        let (mut fx, vault) = fixture();
        deposit(&mut fx, &vault, wad(10));
        fx.gauge
            .notify_reward(&mut fx.tokens, TREASURY, VELO, VAULT, wad(3))
            .unwrap();
        let pending = vault.view_pending_rewards(&fx.gauge, VELO).unwrap();
        assert_eq!(pending, wad(3));

        assert_eq!(
            vault.claim_rewards(fx.ctx(), ALICE, &[]),
            Err(VaultError::EmptyInputArray)
        );
        assert_eq!(
            vault.claim_rewards(fx.ctx(), BOB, &[VELO]),
            Err(VaultError::AccessDenied(Authority::OwnerOrApproved))
        );

        let claimed = vault.claim_rewards(fx.ctx(), ALICE, &[VELO, VELO]).unwrap();
        assert_eq!(claimed, vec![(VELO, pending)]);
        assert_eq!(fx.tokens.balance_of(VELO, ALICE), pending);
        assert!(fx.tokens.balance_of(VELO, VAULT).is_zero());
        assert_eq!(vault.view_pending_rewards(&fx.gauge, VELO), Ok(TokenAmount::zero()));
    }

    #[test]
    fn test_pending_rewards_for_untracked_token_is_zero() {
        let (fx, vault) = fixture();
        assert_eq!(vault.view_pending_rewards(&fx.gauge, LP), Ok(TokenAmount::zero()));
    }

    /// Venue whose every call fails.
    struct PausedVenue;

    impl StakingVenue for PausedVenue {
        fn address(&self) -> Address {
            GAUGE
        }

        fn staking_token(&self) -> Address {
            LP
        }

        fn balance_of(&self, _: Address) -> TokenAmount {
            TokenAmount::zero()
        }

        fn deposit(&mut self, _: &mut dyn TokenLedger, _: Address, _: TokenAmount) -> Result<()> {
            Err(paused())
        }

        fn withdraw(&mut self, _: &mut dyn TokenLedger, _: Address, _: TokenAmount) -> Result<()> {
            Err(paused())
        }

        fn claim(&mut self, _: &mut dyn TokenLedger, _: Address, _: &[Address]) -> Result<()> {
            Err(paused())
        }

        fn earned(&self, _: Address, _: Address) -> Result<TokenAmount> {
            Err(paused())
        }
    }

    fn paused() -> VaultError {
        VaultError::Collaborator("gauge paused".into())
    }

    #[test]
    fn test_pending_rewards_propagates_venue_failure() {
        let (_, vault) = fixture();
        assert_eq!(vault.view_pending_rewards(&PausedVenue, VELO), Err(paused()));
    }

    #[test]
    fn test_vault_refuses_records() {
        let (fx, vault) = fixture();
        assert!(!vault.on_record_received(&fx.registry, ALICE, ALICE, PositionId(1)));
    }
}
