//! Ephemeral multi-node validator cluster orchestration.
//!
//! `ClusterHandle` owns the complete Docker lifecycle:
//!
//! 1. **On creation (`new`)** — removes any stale cluster left by a prior
//!    crashed run, starts N validator containers with deterministic
//!    addressing, and blocks until every member reports the local chain id.
//! 2. **During the test** — one-time bootstrap funding from the genesis
//!    root account, peer-to-peer faucet transfers, ledger snapshots, and
//!    block-progress waits.
//! 3. **On teardown** — stops all containers and removes volumes and the
//!    cluster network; runs on explicit `teardown`, on SIGINT/SIGTERM, and
//!    on drop, exactly once. Works even on panic.
//!
//! Members bind fixed host ports, so tests must run sequentially:
//! `cargo test -- --test-threads=1` (or `#[serial]`).
//!
//! # Example
//! ```no_run
//! use localnet_cluster::ClusterHandle;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cluster = ClusterHandle::new(4).await?;
//! cluster.bootstrap(100_000).await?;
//!
//! let hash = cluster.fund("0xfeed", 100).await?;
//! println!("funded in {hash}");
//!
//! cluster.wait_for_blocks(0, 5, std::time::Duration::from_secs(30)).await?;
//! cluster.teardown()?;
//! # Ok(())
//! # }
//! ```

mod client;
mod compose;
mod error;
mod funding;
mod handle;
mod home;
mod lifecycle;
mod progress;
mod readiness;
mod supervisor;

pub use client::MemberClient;
pub use error::{ClientError, FundingError, StartupError, TeardownError, TimeoutError};
pub use funding::TxHash;
pub use handle::{purge, ClusterHandle};
pub use home::ClusterHome;

#[cfg(test)]
mod tests;
