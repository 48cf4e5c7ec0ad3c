use crate::address::Address;
use crate::position::PositionId;
use serde::{Deserialize, Serialize};

/// Externally observable events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// An admin granted the minter role.
    MinterAdded { minter: Address, granted_by: Address },
    /// A record was split; `child` was carved out of `parent`.
    PositionSplit { parent: PositionId, child: PositionId },
    /// The factory deployed a vault for `owner`.
    VaultCreated { owner: Address, vault: Address },
}

/// Events emitted during a call, drained by the runtime once the call commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBuffer(Vec<LedgerEvent>);

impl EventBuffer {
    pub fn emit(&mut self, event: LedgerEvent) {
        self.0.push(event);
    }

    pub fn drain(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.0)
    }

    pub fn pending(&self) -> &[LedgerEvent] {
        &self.0
    }
}
