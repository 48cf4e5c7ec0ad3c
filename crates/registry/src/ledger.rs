//! Position records, roles and ownership-token semantics.

use crate::receiver::RecordReceiver;
use lp_receipts_domain::math::fixed_point::{WAD, split_amount};
use lp_receipts_domain::{
    Address, Authority, EventBuffer, LedgerEvent, PoolConfig, PositionId, PositionRecord,
    Result, Role, RoleSet, TokenAmount, VaultError,
};
use lp_receipts_protocols::oracle::PriceOracle;
use lp_receipts_protocols::quoter::PoolQuoter;
use primitive_types::U256;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ledger of splittable position records for one pool.
///
/// Cloning is cheap enough for the runtime to stage each call on a copy; the oracle and
/// quoter handles are shared.
#[derive(Clone)]
pub struct PositionRegistry {
    name: String,
    symbol: String,
    config: PoolConfig,
    roles: RoleSet,
    records: BTreeMap<PositionId, PositionRecord>,
    holdings: HashMap<Address, u64>,
    operators: HashSet<(Address, Address)>,
    last_id: u64,
    pub(crate) quoter: Arc<dyn PoolQuoter>,
    pub(crate) oracle: Arc<dyn PriceOracle>,
    events: EventBuffer,
}

impl fmt::Debug for PositionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionRegistry")
            .field("name", &self.name)
            .field("symbol", &self.symbol)
            .field("config", &self.config)
            .field("records", &self.records.len())
            .field("last_id", &self.last_id)
            .finish_non_exhaustive()
    }
}

impl PositionRegistry {
    /// Creates a registry. `deployer` becomes its first admin.
    pub fn new(
        deployer: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        config: PoolConfig,
        quoter: Arc<dyn PoolQuoter>,
        oracle: Arc<dyn PriceOracle>,
    ) -> Self {
        let name = name.into();
        info!(
            deployer = %deployer,
            name = %name,
            stable_leg = ?config.stable_leg(),
            "Position registry created"
        );
        Self {
            name,
            symbol: symbol.into(),
            config,
            roles: RoleSet::with_admin(deployer),
            records: BTreeMap::new(),
            holdings: HashMap::new(),
            operators: HashSet::new(),
            last_id: 0,
            quoter,
            oracle,
            events: EventBuffer::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.roles.has_role(role, account)
    }

    /// Number of live records.
    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    pub fn record(&self, id: PositionId) -> Result<&PositionRecord> {
        self.records.get(&id).ok_or(VaultError::UnknownRecord(id))
    }

    pub fn owner_of(&self, id: PositionId) -> Result<Address> {
        self.record(id).map(|r| r.owner)
    }

    pub fn pooled_tokens(&self, id: PositionId) -> Result<TokenAmount> {
        self.record(id).map(|r| r.pooled_amount)
    }

    /// Number of records held by `owner`.
    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.holdings.get(owner).copied().unwrap_or(0)
    }

    pub fn get_approved(&self, id: PositionId) -> Result<Option<Address>> {
        self.record(id).map(|r| r.approved)
    }

    pub fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.operators.contains(&(*owner, *operator))
    }

    /// True if `spender` owns `id`, is its approved delegate, or is an operator for its owner.
    pub fn is_approved_or_owner(&self, spender: &Address, id: PositionId) -> Result<bool> {
        let record = self.record(id)?;
        Ok(record.owner == *spender
            || record.approved == Some(*spender)
            || self.is_approved_for_all(&record.owner, spender))
    }

    /// Records held by `owner`, in id order.
    pub fn records_of(&self, owner: &Address) -> Vec<&PositionRecord> {
        self.records.values().filter(|r| r.owner == *owner).collect()
    }

    /// Grants the minter role. Idempotent; the event is emitted on every successful call.
    ///
    /// # Errors
    /// `AccessDenied(Admin)` if `caller` is not an admin.
    pub fn add_minter(&mut self, caller: Address, minter: Address) -> Result<bool> {
        let added = self.roles.grant_minter(&caller, minter).inspect_err(|_| {
            warn!(caller = %caller, minter = %minter, "Minter grant rejected");
        })?;
        self.events.emit(LedgerEvent::MinterAdded {
            minter,
            granted_by: caller,
        });
        info!(minter = %minter, admin = %caller, added, "Minter added");
        Ok(added)
    }

    /// Creates a record of `amount` owned by `to`, issued by `caller`.
    ///
    /// # Errors
    /// `AccessDenied(Minter)` if `caller` is not a minter; `UnsafeRecipient` for the zero address.
    pub fn mint(&mut self, caller: Address, to: Address, amount: TokenAmount) -> Result<PositionId> {
        self.roles.require(Role::Minter, &caller)?;
        if to.is_zero() {
            return Err(VaultError::UnsafeRecipient(to));
        }

        let id = self.next_id();
        self.records
            .insert(id, PositionRecord::new(id, to, caller, amount));
        *self.holdings.entry(to).or_insert(0) += 1;

        info!(position = %id, owner = %to, minter = %caller, amount = %amount, "Position minted");
        Ok(id)
    }

    /// Deletes a record entirely and returns it.
    ///
    /// # Errors
    /// `AccessDenied(Minter)` unless `caller` is a minter and issued the record;
    /// `UnknownRecord` if absent.
    pub fn burn(&mut self, caller: Address, id: PositionId) -> Result<PositionRecord> {
        self.roles.require(Role::Minter, &caller)?;
        let record = self.record(id)?;
        if record.issuer != caller {
            warn!(position = %id, caller = %caller, issuer = %record.issuer, "Burn by foreign minter rejected");
            return Err(VaultError::AccessDenied(Authority::Minter));
        }

        let record = self.records.remove(&id).ok_or(VaultError::UnknownRecord(id))?;
        self.decrement_holdings(&record.owner);

        info!(position = %id, owner = %record.owner, amount = %record.pooled_amount, "Position burned");
        Ok(record)
    }

    /// Carves `fraction / 1e18` of a record into a new record for the same owner.
    ///
    /// The child gets `floor(parent * fraction / 1e18)`; the parent keeps the exact rest.
    ///
    /// # Errors
    /// `InvalidSplitFraction` for fractions of 1e18 or more, `UnknownRecord`, or
    /// `AccessDenied(OwnerOrApproved)`.
    pub fn split(&mut self, caller: Address, id: PositionId, fraction: U256) -> Result<PositionId> {
        if fraction >= WAD {
            return Err(VaultError::InvalidSplitFraction);
        }
        let parent = self.record(id)?.clone();
        if !self.is_approved_or_owner(&caller, id)? {
            warn!(position = %id, caller = %caller, "Split by non-owner rejected");
            return Err(VaultError::AccessDenied(Authority::OwnerOrApproved));
        }

        let child_amount = split_amount(parent.pooled_amount, fraction)?;
        let remaining = parent.pooled_amount.checked_sub(child_amount)?;
        let child_id = self.next_id();
        let child = parent.fork(child_id, child_amount);
        let owner = child.owner;

        if let Some(parent) = self.records.get_mut(&id) {
            parent.pooled_amount = remaining;
        }
        self.records.insert(child_id, child);
        *self.holdings.entry(owner).or_insert(0) += 1;

        self.events.emit(LedgerEvent::PositionSplit {
            parent: id,
            child: child_id,
        });
        info!(
            parent = %id,
            child = %child_id,
            child_amount = %child_amount,
            remaining = %remaining,
            "Position split"
        );
        Ok(child_id)
    }

    /// Sets the single-address delegate of a record. `None` clears it.
    ///
    /// # Errors
    /// `AccessDenied(OwnerOrApproved)` unless `caller` is the owner or an operator for the owner.
    pub fn approve(&mut self, caller: Address, to: Option<Address>, id: PositionId) -> Result<()> {
        let owner = self.owner_of(id)?;
        if caller != owner && !self.is_approved_for_all(&owner, &caller) {
            return Err(VaultError::AccessDenied(Authority::OwnerOrApproved));
        }
        if let Some(record) = self.records.get_mut(&id) {
            record.approved = to;
        }
        debug!(position = %id, approved = ?to, "Position approval set");
        Ok(())
    }

    /// Grants or revokes `operator` over every record `caller` holds, now and later.
    pub fn set_approval_for_all(&mut self, caller: Address, operator: Address, approved: bool) {
        if approved {
            self.operators.insert((caller, operator));
        } else {
            self.operators.remove(&(caller, operator));
        }
        debug!(owner = %caller, operator = %operator, approved, "Operator approval set");
    }

    /// Moves a record from `from` to `to`, clearing its delegate.
    ///
    /// # Errors
    /// `UnknownRecord`, `AccessDenied(OwnerOrApproved)` if `caller` may not move it or
    /// `from` is not the owner, `UnsafeRecipient` for the zero address.
    pub fn transfer_from(&mut self, caller: Address, from: Address, to: Address, id: PositionId) -> Result<()> {
        self.check_transfer(caller, from, to, id)?;
        self.move_record(from, to, id);
        Ok(())
    }

    /// Like [`transfer_from`](Self::transfer_from), but a contract recipient must accept
    /// the record through its [`RecordReceiver`] callback once ownership has moved.
    ///
    /// # Errors
    /// Everything `transfer_from` returns, plus `UnsafeRecipient` if the recipient refuses;
    /// the record then goes back to `from` with its delegate restored.
    pub fn safe_transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        id: PositionId,
        receiver: Option<&dyn RecordReceiver>,
    ) -> Result<()> {
        self.check_transfer(caller, from, to, id)?;
        let delegate = self.get_approved(id)?;
        self.move_record(from, to, id);
        if let Some(receiver) = receiver {
            if !receiver.on_record_received(self, caller, from, id) {
                warn!(position = %id, to = %to, "Recipient refused position");
                self.move_record(to, from, id);
                if let Some(record) = self.records.get_mut(&id) {
                    record.approved = delegate;
                }
                return Err(VaultError::UnsafeRecipient(to));
            }
        }
        Ok(())
    }

    /// Drains events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        self.events.drain()
    }

    fn check_transfer(&self, caller: Address, from: Address, to: Address, id: PositionId) -> Result<()> {
        if !self.is_approved_or_owner(&caller, id)? || self.owner_of(id)? != from {
            return Err(VaultError::AccessDenied(Authority::OwnerOrApproved));
        }
        if to.is_zero() {
            return Err(VaultError::UnsafeRecipient(to));
        }
        Ok(())
    }

    fn move_record(&mut self, from: Address, to: Address, id: PositionId) {
        if let Some(record) = self.records.get_mut(&id) {
            record.owner = to;
            record.approved = None;
        }
        self.decrement_holdings(&from);
        *self.holdings.entry(to).or_insert(0) += 1;
        info!(position = %id, from = %from, to = %to, "Position transferred");
    }

    fn decrement_holdings(&mut self, owner: &Address) {
        if let Some(count) = self.holdings.get_mut(owner) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.holdings.remove(owner);
            }
        }
    }

    fn next_id(&mut self) -> PositionId {
        self.last_id += 1;
        PositionId(self.last_id)
    }
}
