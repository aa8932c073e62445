//! Lifecycle control: the process-wide cluster slot, the once-guarded
//! cleanup, and termination-signal interception.
//!
//! All members bind fixed host ports, so only one cluster can be live per
//! machine; the process slot enforces that within a process. Cleanup is
//! guarded so that the explicit `teardown`, the signal handler, and the
//! panic/Drop path together run it exactly once. A non-interceptable kill
//! cannot be caught; that residue is reclaimed by the idempotent stale
//! cleanup on the next startup.

use crate::error::{StartupError, TeardownError};
use crate::home::ClusterHome;
use crate::supervisor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

static CLUSTER_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Claim the process-wide cluster slot.
pub fn claim_process_slot() -> Result<(), StartupError> {
    if CLUSTER_ACTIVE
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(StartupError::ClusterActive);
    }
    Ok(())
}

/// Release the process-wide cluster slot.
pub fn release_process_slot() {
    CLUSTER_ACTIVE.store(false, Ordering::Release);
}

/// Once-guarded resource reclamation shared by every exit path.
pub struct Cleanup {
    home: ClusterHome,
    done: AtomicBool,
}

impl Cleanup {
    pub fn new(home: ClusterHome) -> Self {
        Self {
            home,
            done: AtomicBool::new(false),
        }
    }

    /// Stop every member and remove volumes and the cluster network, then
    /// release the process slot. Returns `None` when cleanup already ran.
    pub fn run(&self) -> Option<Result<(), TeardownError>> {
        if self.done.swap(true, Ordering::AcqRel) {
            return None;
        }
        let result = supervisor::down(&self.home);
        release_process_slot();
        Some(result)
    }

    /// Whether cleanup has already run.
    pub fn has_run(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub fn home(&self) -> &ClusterHome {
        &self.home
    }
}

/// Intercept SIGINT/SIGTERM and tear the cluster down before exiting.
///
/// Registered when the cluster handle is created and aborted at successful
/// teardown. The process exits 0 when teardown succeeds and 1 when it
/// fails.
#[cfg(unix)]
pub fn spawn_signal_task(cleanup: Arc<Cleanup>) -> tokio::task::JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut interrupt = match signal(SignalKind::interrupt()) {
            Ok(stream) => stream,
            Err(err) => {
                error!(%err, "failed to register SIGINT handler");
                return;
            }
        };
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                error!(%err, "failed to register SIGTERM handler");
                return;
            }
        };

        tokio::select! {
            _ = interrupt.recv() => info!("caught SIGINT, tearing down cluster"),
            _ = terminate.recv() => info!("caught SIGTERM, tearing down cluster"),
        }

        let code = match cleanup.run() {
            Some(Ok(())) | None => 0,
            Some(Err(err)) => {
                error!(%err, "teardown failed during signal handling");
                1
            }
        };
        std::process::exit(code);
    })
}

#[cfg(not(unix))]
pub fn spawn_signal_task(cleanup: Arc<Cleanup>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            error!("failed to register ctrl-c handler");
            return;
        }
        info!("caught ctrl-c, tearing down cluster");
        let code = match cleanup.run() {
            Some(Ok(())) | None => 0,
            Some(Err(err)) => {
                error!(%err, "teardown failed during signal handling");
                1
            }
        };
        std::process::exit(code);
    })
}

/// Best-effort cleanup for the panic and early-drop paths.
pub fn cleanup_on_drop(cleanup: &Cleanup) {
    match cleanup.run() {
        Some(Ok(())) => info!("cluster torn down on drop"),
        Some(Err(err)) => warn!(%err, "best-effort teardown on drop failed; next startup will reclaim"),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn scratch_home() -> (tempfile::TempDir, ClusterHome) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("genesis-artifacts")).unwrap();
        std::fs::write(
            dir.path()
                .join("genesis-artifacts/root-account-private-keys.yaml"),
            "account_address: 01\n",
        )
        .unwrap();
        let home = ClusterHome::discover(Some(dir.path())).unwrap();
        (dir, home)
    }

    #[test]
    #[serial]
    fn test_process_slot_is_exclusive() {
        claim_process_slot().expect("slot should be free");
        assert!(matches!(
            claim_process_slot(),
            Err(StartupError::ClusterActive)
        ));
        release_process_slot();
        claim_process_slot().expect("slot should be free again");
        release_process_slot();
    }

    #[test]
    #[serial]
    fn test_cleanup_runs_exactly_once() {
        claim_process_slot().unwrap();
        let (_dir, home) = scratch_home();
        let cleanup = Cleanup::new(home);

        assert!(!cleanup.has_run());
        // First run executes (the down itself may fail without an engine;
        // the guard must flip regardless).
        assert!(cleanup.run().is_some());
        assert!(cleanup.has_run());
        // Second and third calls are no-ops.
        assert!(cleanup.run().is_none());
        assert!(cleanup.run().is_none());
    }

    #[test]
    #[serial]
    fn test_cleanup_releases_process_slot() {
        claim_process_slot().unwrap();
        let (_dir, home) = scratch_home();
        let cleanup = Cleanup::new(home);

        let _ = cleanup.run();
        claim_process_slot().expect("cleanup should have released the slot");
        release_process_slot();
    }
}
