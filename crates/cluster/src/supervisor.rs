//! Process/container supervision via the Docker engine.
//!
//! Starts and stops one network-isolated validator container per member
//! with deterministic addressing. All engine interaction goes through the
//! `docker` CLI so cleanup also works from non-async contexts (Drop, signal
//! handlers).

use crate::compose::{self, PROJECT};
use crate::error::{StartupError, TeardownError};
use crate::home::ClusterHome;
use localnet_types::{ClusterSpec, MemberHandle};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Verify the container engine is reachable.
pub fn check_engine() -> Result<(), StartupError> {
    let status = Command::new("docker")
        .args(["info"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| StartupError::EnvironmentUnavailable(e.to_string()))?;

    if !status.success() {
        return Err(StartupError::EnvironmentUnavailable(
            "docker daemon is not running".to_string(),
        ));
    }
    Ok(())
}

/// Launch `spec.num_members` validator containers.
///
/// Renders the compose file into the cluster home, idempotently removes any
/// stale same-project cluster left by a prior crashed run, then starts the
/// new one. A failed start is rolled back before returning so no partial
/// cluster state is left behind.
pub fn start(spec: &ClusterSpec, home: &ClusterHome) -> Result<Vec<MemberHandle>, StartupError> {
    check_engine()?;

    std::fs::write(home.compose_path(), compose::render(spec))
        .map_err(StartupError::WriteCompose)?;

    // Stale clusters share our project name; "nothing to remove" is success.
    cleanup_stale(home);

    info!(members = spec.num_members, image = %spec.image, "starting validator containers");
    if let Err((command, stderr)) = run_compose(home, &["up", "-d"]) {
        warn!(%stderr, "compose up failed, rolling back");
        cleanup_stale(home);
        return Err(StartupError::Compose { command, stderr });
    }

    Ok((0..spec.num_members)
        .map(|i| MemberHandle::new(i, &spec.subnet, home.validator_key_path(i)))
        .collect())
}

/// Remove any cluster with our project identity, ignoring failures.
pub fn cleanup_stale(home: &ClusterHome) {
    if let Err((_, stderr)) = run_compose(home, &["down", "--remove-orphans", "-v"]) {
        debug!(%stderr, "stale cleanup reported an error (ignored)");
    }
}

/// Gracefully stop all members within `budget`.
pub fn stop_graceful(home: &ClusterHome, budget: Duration) -> Result<(), TeardownError> {
    let timeout = budget.as_secs().max(1).to_string();
    run_compose(home, &["stop", "-t", &timeout])
        .map_err(|(command, stderr)| TeardownError::Compose { command, stderr })
}

/// Force-remove all members, their volumes and the cluster network.
pub fn down(home: &ClusterHome) -> Result<(), TeardownError> {
    run_compose(home, &["down", "--remove-orphans", "-v"])
        .map_err(|(command, stderr)| TeardownError::Compose { command, stderr })
}

/// Capture the tail of every member's logs, for debugging failed startups.
pub fn dump_logs(home: &ClusterHome, tail: usize) -> Option<String> {
    let output = Command::new("docker")
        .args(["compose", "-p", PROJECT, "-f"])
        .arg(home.compose_path())
        .args(["logs", "--tail", &tail.to_string()])
        .current_dir(home.root())
        .output()
        .ok()?;
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn run_compose(home: &ClusterHome, args: &[&str]) -> Result<(), (String, String)> {
    let output = Command::new("docker")
        .args(["compose", "-p", PROJECT, "-f"])
        .arg(home.compose_path())
        .args(args)
        .current_dir(home.root())
        .output()
        .map_err(|e| (args.join(" "), e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err((args.join(" "), stderr));
    }
    Ok(())
}
