//! Point-in-time ledger reads.

use serde::{Deserialize, Serialize};

/// An immutable, point-in-time read from one member's ledger-status
/// endpoint.
///
/// Always freshly fetched; never cached beyond a single query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Chain identifier reported by the member.
    pub chain_id: u8,
    /// Consensus epoch.
    pub epoch: u64,
    /// Height of the latest committed block.
    pub block_height: u64,
    /// Ledger version (increments on every transaction, including no-ops).
    pub ledger_version: u64,
    /// Timestamp of the latest committed block, in microseconds.
    pub ledger_timestamp_usecs: u64,
}
