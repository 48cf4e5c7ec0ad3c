use crate::ledger::PositionRegistry;
use lp_receipts_domain::{Address, PositionId};

/// Callback invoked on the recipient of a safe record transfer.
///
/// Runs after ownership has moved, so `registry` already shows the recipient as owner.
/// Returning false refuses the record and reverts the transfer.
pub trait RecordReceiver {
    fn on_record_received(
        &self,
        registry: &PositionRegistry,
        operator: Address,
        from: Address,
        id: PositionId,
    ) -> bool;
}
