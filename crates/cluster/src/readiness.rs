//! Readiness probing.
//!
//! A member is ready only once its status endpoint answers *and* reports
//! the expected local chain id. A responding member with the wrong chain id
//! is a stale container from an unrelated process occupying our ports, and
//! counts as not-yet-ready.

use crate::client::MemberClient;
use crate::error::TimeoutError;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Poll every member until all are ready or `timeout` expires.
///
/// Members are probed concurrently so total wall-clock is bounded by the
/// slowest member, not the sum. The timeout is absolute.
pub async fn await_ready(
    clients: &[MemberClient],
    expected_chain_id: u8,
    timeout: Duration,
    interval: Duration,
) -> Result<(), TimeoutError> {
    let deadline = Instant::now() + timeout;

    let probes = clients
        .iter()
        .enumerate()
        .map(|(index, client)| probe_member(index, client, expected_chain_id, deadline, interval));
    let results = futures::future::join_all(probes).await;

    let pending: Vec<usize> = results.into_iter().filter_map(|r| r.err()).collect();
    if pending.is_empty() {
        info!(members = clients.len(), "all members ready");
        return Ok(());
    }

    Err(TimeoutError::new(
        format!("members {pending:?} to become ready"),
        timeout,
    ))
}

/// Poll one member until ready. Returns its index on timeout.
async fn probe_member(
    index: usize,
    client: &MemberClient,
    expected_chain_id: u8,
    deadline: Instant,
    interval: Duration,
) -> Result<(), usize> {
    loop {
        match client.ledger_info().await {
            Ok(snapshot) if snapshot.chain_id == expected_chain_id => {
                debug!(member = index, height = snapshot.block_height, "member ready");
                return Ok(());
            }
            Ok(snapshot) => {
                // Wrong identity: likely a stale container on our port.
                debug!(
                    member = index,
                    got = snapshot.chain_id,
                    expected = expected_chain_id,
                    "member reports wrong chain id"
                );
            }
            Err(err) => {
                debug!(member = index, %err, "member not responding yet");
            }
        }

        if Instant::now() + interval > deadline {
            return Err(index);
        }
        tokio::time::sleep(interval).await;
    }
}
