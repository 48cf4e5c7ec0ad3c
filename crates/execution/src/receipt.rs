//! Transaction receipts and the committed event log.

use chrono::{DateTime, Utc};
use lp_receipts_domain::{Address, LedgerEvent};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of a committed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt<T> {
    /// Transaction ID.
    pub tx_id: Uuid,
    /// Calling account.
    pub caller: Address,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
    /// Events the call emitted, in order.
    pub events: Vec<LedgerEvent>,
    /// Value returned by the call.
    pub value: T,
}

impl<T> Receipt<T> {
    /// Drops the metadata and keeps the returned value.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// An event as recorded in the chain's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Transaction that emitted the event.
    pub tx_id: Uuid,
    /// Event payload.
    pub event: LedgerEvent,
}
