//! Chain state and atomic call execution.

use crate::clock::Clock;
use crate::receipt::{LoggedEvent, Receipt};
use lp_receipts_domain::math::RedemptionQuote;
use lp_receipts_domain::{
    Address, LedgerEvent, PoolConfig, PositionId, PositionRecord, Result, Role, TokenAmount,
    VaultError,
};
use lp_receipts_protocols::oracle::PriceOracle;
use lp_receipts_protocols::quoter::PoolQuoter;
use lp_receipts_protocols::staking::InMemoryGauge;
use lp_receipts_protocols::token::{InMemoryTokenLedger, TokenLedger};
use lp_receipts_registry::{PositionRegistry, RecordReceiver};
use lp_receipts_vault::{VaultContext, VaultController, VaultFactory, Withdrawal};
use primitive_types::U256;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Deployment parameters for a fresh chain.
#[derive(Debug, Clone)]
pub struct Genesis {
    /// Factory address; deploys and administers the registry.
    pub factory: Address,
    /// Registry address.
    pub registry: Address,
    /// Registry name, e.g. "Deposit_Receipt".
    pub name: String,
    /// Registry symbol, e.g. "DR".
    pub symbol: String,
    pub pool: PoolConfig,
    /// Pooled token accepted by vaults and the gauge.
    pub staking_token: Address,
    /// Gauge address.
    pub gauge: Address,
    /// Tokens the gauge pays rewards in.
    pub reward_tokens: Vec<Address>,
}

/// Everything a call can touch. Cloned for each mutating call and swapped in on success.
#[derive(Debug, Clone)]
pub struct ChainState {
    pub tokens: InMemoryTokenLedger,
    pub gauge: InMemoryGauge,
    pub registry: PositionRegistry,
    pub factory: VaultFactory,
    /// Deployed vaults by vault address.
    pub vaults: BTreeMap<Address, VaultController>,
}

impl ChainState {
    /// Vault deployed at `address`.
    ///
    /// # Errors
    /// `UnknownVault` if nothing is deployed there.
    pub fn vault(&self, address: Address) -> Result<&VaultController> {
        self.vaults
            .get(&address)
            .ok_or(VaultError::UnknownVault(address))
    }

    fn vault_call<T>(
        &mut self,
        address: Address,
        call: impl FnOnce(&VaultController, VaultContext<'_>) -> Result<T>,
    ) -> Result<T> {
        let vault = self.vault(address)?.clone();
        let ctx = VaultContext {
            registry: &mut self.registry,
            tokens: &mut self.tokens,
            venue: &mut self.gauge,
        };
        call(&vault, ctx)
    }

    fn drain_events(&mut self) -> Vec<LedgerEvent> {
        let mut events = self.registry.take_events();
        events.extend(self.factory.take_events());
        events
    }
}

/// In-process chain: registry, factory, vaults, token ledger and gauge behind one lock.
///
/// Each mutating call runs against a copy of the state and replaces it only if the call
/// succeeds, so a failed call leaves balances, records and the event log untouched.
/// The event log sits outside the staged state and is only appended on commit.
#[derive(Clone)]
pub struct Chain {
    state: Arc<RwLock<ChainState>>,
    log: Arc<RwLock<Vec<LoggedEvent>>>,
    clock: Arc<dyn Clock>,
}

impl Chain {
    /// Deploys the registry, factory and gauge described by `genesis`.
    pub fn new(
        genesis: Genesis,
        quoter: Arc<dyn PoolQuoter>,
        oracle: Arc<dyn PriceOracle>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = PositionRegistry::new(
            genesis.factory,
            genesis.name,
            genesis.symbol,
            genesis.pool,
            quoter,
            oracle,
        );
        let factory = VaultFactory::new(
            genesis.factory,
            genesis.registry,
            genesis.staking_token,
            genesis.gauge,
        );
        let mut gauge = InMemoryGauge::new(genesis.gauge, genesis.staking_token);
        for token in &genesis.reward_tokens {
            gauge.add_reward_token(*token);
        }

        info!(
            factory = %genesis.factory,
            registry = %genesis.registry,
            gauge = %genesis.gauge,
            reward_tokens = genesis.reward_tokens.len(),
            "Chain deployed"
        );

        Self {
            state: Arc::new(RwLock::new(ChainState {
                tokens: InMemoryTokenLedger::new(),
                gauge,
                registry,
                factory,
                vaults: BTreeMap::new(),
            })),
            log: Arc::new(RwLock::new(Vec::new())),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Runs `call` as one atomic transaction from `caller`.
    ///
    /// # Errors
    /// Whatever `call` returns; state is left as it was.
    pub async fn execute<T>(
        &self,
        caller: Address,
        method: &str,
        call: impl FnOnce(&mut ChainState) -> Result<T>,
    ) -> Result<Receipt<T>> {
        let mut state = self.state.write().await;
        let mut working = state.clone();

        let value = call(&mut working).inspect_err(|e| {
            warn!(caller = %caller, method, error = %e, "Call reverted");
        })?;

        let tx_id = Uuid::new_v4();
        let events = working.drain_events();
        *state = working;
        // appended while the state lock is held so log order matches commit order
        self.log
            .write()
            .await
            .extend(events.iter().cloned().map(|event| LoggedEvent { tx_id, event }));
        drop(state);

        debug!(tx_id = %tx_id, caller = %caller, method, events = events.len(), "Call committed");
        Ok(Receipt {
            tx_id,
            caller,
            timestamp: self.clock.now(),
            events,
            value,
        })
    }

    /// Runs `read` against a shared view of the state.
    pub async fn read<T>(&self, read: impl FnOnce(&ChainState) -> T) -> T {
        let state = self.state.read().await;
        read(&state)
    }

    // Token ledger

    /// Credits freshly minted fungible tokens to `to`.
    pub async fn mint_tokens(&self, token: Address, to: Address, amount: TokenAmount) -> Result<Receipt<()>> {
        self.execute(Address::ZERO, "mintTokens", |s| s.tokens.mint(token, to, amount))
            .await
    }

    pub async fn approve_tokens(
        &self,
        caller: Address,
        token: Address,
        spender: Address,
        amount: TokenAmount,
    ) -> Result<Receipt<()>> {
        self.execute(caller, "approve", |s| {
            s.tokens.approve(token, caller, spender, amount);
            Ok(())
        })
        .await
    }

    pub async fn transfer_tokens(
        &self,
        caller: Address,
        token: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<Receipt<()>> {
        self.execute(caller, "transfer", |s| s.tokens.transfer(token, caller, to, amount))
            .await
    }

    /// Funds `amount` of reward `token` from `funder` and accrues it to `account` in the gauge.
    pub async fn notify_reward(
        &self,
        funder: Address,
        token: Address,
        account: Address,
        amount: TokenAmount,
    ) -> Result<Receipt<()>> {
        self.execute(funder, "notifyReward", |s| {
            s.gauge
                .notify_reward(&mut s.tokens, funder, token, account, amount)
        })
        .await
    }

    // Factory

    /// Deploys a vault for `caller`. Returns the vault address.
    pub async fn make_new_depositor(&self, caller: Address) -> Result<Receipt<Address>> {
        self.execute(caller, "makeNewDepositor", |s| {
            let vault = s.factory.make_new_depositor(caller, &mut s.registry)?;
            let address = vault.address();
            s.vaults.insert(address, vault);
            Ok(address)
        })
        .await
    }

    // Vaults

    pub async fn deposit_to_gauge(
        &self,
        caller: Address,
        vault: Address,
        amount: TokenAmount,
    ) -> Result<Receipt<PositionId>> {
        self.execute(caller, "depositToGauge", |s| {
            s.vault_call(vault, |v, ctx| v.deposit_to_gauge(ctx, caller, amount))
        })
        .await
    }

    pub async fn withdraw_from_gauge(
        &self,
        caller: Address,
        vault: Address,
        id: PositionId,
        reward_tokens: &[Address],
    ) -> Result<Receipt<Withdrawal>> {
        self.execute(caller, "withdrawFromGauge", |s| {
            s.vault_call(vault, |v, ctx| {
                v.withdraw_from_gauge(ctx, caller, id, reward_tokens)
            })
        })
        .await
    }

    pub async fn claim_rewards(
        &self,
        caller: Address,
        vault: Address,
        reward_tokens: &[Address],
    ) -> Result<Receipt<Vec<(Address, TokenAmount)>>> {
        self.execute(caller, "claimRewards", |s| {
            s.vault_call(vault, |v, ctx| v.claim_rewards(ctx, caller, reward_tokens))
        })
        .await
    }

    // Registry

    pub async fn add_minter(&self, caller: Address, minter: Address) -> Result<Receipt<bool>> {
        self.execute(caller, "addMinter", |s| s.registry.add_minter(caller, minter))
            .await
    }

    pub async fn mint_record(
        &self,
        caller: Address,
        to: Address,
        amount: TokenAmount,
    ) -> Result<Receipt<PositionId>> {
        self.execute(caller, "mint", |s| s.registry.mint(caller, to, amount))
            .await
    }

    pub async fn burn_record(&self, caller: Address, id: PositionId) -> Result<Receipt<PositionRecord>> {
        self.execute(caller, "burn", |s| s.registry.burn(caller, id)).await
    }

    /// Splits `fraction / 1e18` of record `id` into a new record. Returns the child id.
    pub async fn split(&self, caller: Address, id: PositionId, fraction: U256) -> Result<Receipt<PositionId>> {
        self.execute(caller, "split", |s| s.registry.split(caller, id, fraction))
            .await
    }

    pub async fn approve(&self, caller: Address, to: Option<Address>, id: PositionId) -> Result<Receipt<()>> {
        self.execute(caller, "approve", |s| s.registry.approve(caller, to, id))
            .await
    }

    pub async fn set_approval_for_all(
        &self,
        caller: Address,
        operator: Address,
        approved: bool,
    ) -> Result<Receipt<()>> {
        self.execute(caller, "setApprovalForAll", |s| {
            s.registry.set_approval_for_all(caller, operator, approved);
            Ok(())
        })
        .await
    }

    pub async fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        id: PositionId,
    ) -> Result<Receipt<()>> {
        self.execute(caller, "transferFrom", |s| {
            s.registry.transfer_from(caller, from, to, id)
        })
        .await
    }

    /// Transfers a record, consulting the recipient's callback if it is a deployed vault.
    pub async fn safe_transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        id: PositionId,
    ) -> Result<Receipt<()>> {
        self.execute(caller, "safeTransferFrom", |s| {
            let receiver = s.vaults.get(&to).map(|v| v as &dyn RecordReceiver);
            s.registry.safe_transfer_from(caller, from, to, id, receiver)
        })
        .await
    }

    // Reads

    // Valuation reads release the state lock before awaiting the quoter or oracle.

    /// USD value of `liquidity` pooled tokens, 18-decimal fixed point.
    pub async fn price_liquidity(&self, liquidity: TokenAmount) -> Result<TokenAmount> {
        let valuer = self.read(|s| s.registry.valuer()).await;
        valuer.price_liquidity(liquidity, self.clock.unix()).await
    }

    /// USD value of record `id`, 18-decimal fixed point.
    pub async fn price_record(&self, id: PositionId) -> Result<TokenAmount> {
        let (valuer, amount) = self
            .read(|s| Ok::<_, VaultError>((s.registry.valuer(), s.registry.pooled_tokens(id)?)))
            .await?;
        valuer.price_liquidity(amount, self.clock.unix()).await
    }

    pub async fn view_quote_remove_liquidity(&self, liquidity: TokenAmount) -> Result<RedemptionQuote> {
        let valuer = self.read(|s| s.registry.valuer()).await;
        valuer.view_quote_remove_liquidity(liquidity).await
    }

    pub async fn view_pending_rewards(&self, vault: Address, token: Address) -> Result<TokenAmount> {
        self.read(|s| s.vault(vault)?.view_pending_rewards(&s.gauge, token))
            .await
    }

    /// Pooled tokens `vault` has staked in the gauge.
    pub async fn staked(&self, vault: Address) -> Result<TokenAmount> {
        self.read(|s| Ok(s.vault(vault)?.staked(&s.gauge))).await
    }

    pub async fn owner_of(&self, id: PositionId) -> Result<Address> {
        self.read(|s| s.registry.owner_of(id)).await
    }

    pub async fn pooled_tokens(&self, id: PositionId) -> Result<TokenAmount> {
        self.read(|s| s.registry.pooled_tokens(id)).await
    }

    pub async fn record(&self, id: PositionId) -> Result<PositionRecord> {
        self.read(|s| s.registry.record(id).cloned()).await
    }

    pub async fn records_of(&self, owner: Address) -> Vec<PositionRecord> {
        self.read(|s| s.registry.records_of(&owner).into_iter().cloned().collect())
            .await
    }

    pub async fn balance_of(&self, owner: Address) -> u64 {
        self.read(|s| s.registry.balance_of(&owner)).await
    }

    pub async fn get_approved(&self, id: PositionId) -> Result<Option<Address>> {
        self.read(|s| s.registry.get_approved(id)).await
    }

    pub async fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.read(|s| s.registry.is_approved_for_all(&owner, &operator))
            .await
    }

    pub async fn is_approved_or_owner(&self, spender: Address, id: PositionId) -> Result<bool> {
        self.read(|s| s.registry.is_approved_or_owner(&spender, id))
            .await
    }

    pub async fn has_role(&self, role: Role, account: Address) -> bool {
        self.read(|s| s.registry.has_role(role, &account)).await
    }

    pub async fn total_records(&self) -> usize {
        self.read(|s| s.registry.total_records()).await
    }

    pub async fn pool_config(&self) -> PoolConfig {
        self.read(|s| s.registry.config().clone()).await
    }

    pub async fn vault_of(&self, owner: Address) -> Option<Address> {
        self.read(|s| s.factory.vault_of(&owner)).await
    }

    pub async fn vault_count(&self) -> usize {
        self.read(|s| s.factory.vault_count()).await
    }

    /// Fungible balance of `account` in `token`.
    pub async fn token_balance(&self, token: Address, account: Address) -> TokenAmount {
        self.read(|s| s.tokens.balance_of(token, account)).await
    }

    /// Committed events, oldest first.
    pub async fn events(&self) -> Vec<LoggedEvent> {
        self.log.read().await.clone()
    }
}
