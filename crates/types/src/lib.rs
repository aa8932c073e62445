//! Core types for the localnet test-network orchestrator.
//!
//! This crate holds the shared data model: the immutable cluster
//! configuration, the deterministic per-member port layout, member handles,
//! ledger snapshots, and the account key material read from genesis
//! artifacts.

mod account;
mod member;
mod ports;
mod snapshot;
mod spec;

pub use account::{AccountKey, KeyError};
pub use member::MemberHandle;
pub use ports::{member_address, PortLayout, BASE_API_PORT, BASE_METRICS_PORT, BASE_PEER_PORT};
pub use snapshot::LedgerSnapshot;
pub use spec::{ClusterSpec, SpecError, LOCAL_CHAIN_ID, MAX_MEMBERS, MIN_MEMBERS};
