//! Consensus progress tracking.
//!
//! Block height is the progress metric, deliberately not ledger version:
//! version increments on every transaction including no-ops, so it cannot
//! distinguish "a new block was actually produced" from chatter.

use crate::client::MemberClient;
use crate::error::{ClientError, TimeoutError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Wait until the member's block height has advanced by at least `blocks`.
///
/// The height observed at entry is the baseline; `timeout` is an absolute
/// deadline, not a retry count, so the wait stays robust to variable block
/// production rates. Transient query failures keep polling until the
/// deadline.
pub async fn wait_for_blocks(
    client: &MemberClient,
    blocks: u64,
    timeout: Duration,
    interval: Duration,
) -> Result<(), TimeoutError> {
    let deadline = Instant::now() + timeout;
    let timeout_err = || TimeoutError::new(format!("{blocks} more blocks"), timeout);

    // Establish the baseline height first; the member may still be briefly
    // unreachable right after startup.
    let start = loop {
        match client.ledger_info().await {
            Ok(snapshot) => break snapshot.block_height,
            Err(err) => debug!(%err, "baseline snapshot failed, retrying"),
        }
        if Instant::now() + interval > deadline {
            return Err(timeout_err());
        }
        tokio::time::sleep(interval).await;
    };
    let target = start + blocks;
    debug!(start, target, "waiting for block progress");

    loop {
        match client.ledger_info().await {
            Ok(snapshot) if snapshot.block_height >= target => {
                info!(height = snapshot.block_height, "reached target height");
                return Ok(());
            }
            Ok(snapshot) => {
                debug!(height = snapshot.block_height, target, "still waiting");
            }
            Err(err) => debug!(%err, "snapshot failed, retrying"),
        }
        if Instant::now() + interval > deadline {
            return Err(timeout_err());
        }
        tokio::time::sleep(interval).await;
    }
}

/// Collect the current block height of every member, concurrently.
pub async fn member_heights(clients: &[MemberClient]) -> Result<Vec<u64>, ClientError> {
    let snapshots =
        futures::future::join_all(clients.iter().map(|client| client.ledger_info())).await;
    snapshots
        .into_iter()
        .map(|result| result.map(|snapshot| snapshot.block_height))
        .collect()
}

/// Spread between the highest and lowest reported height.
pub fn height_spread(heights: &[u64]) -> u64 {
    match (heights.iter().max(), heights.iter().min()) {
        (Some(max), Some(min)) => max - min,
        _ => 0,
    }
}

/// Whether members are healthily synced: spread within `tolerance`.
pub fn is_synced(heights: &[u64], tolerance: u64) -> bool {
    height_spread(heights) <= tolerance
}
