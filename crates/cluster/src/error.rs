//! Error taxonomy for cluster orchestration.
//!
//! Setup-phase errors (`StartupError`) abort immediately and trigger
//! best-effort cleanup of whatever was partially created. Steady-state
//! errors (`TimeoutError`, `FundingError`) are returned to the caller for
//! test-level handling. Teardown errors are surfaced but never block
//! process exit.

use localnet_types::{KeyError, SpecError, MAX_MEMBERS, MIN_MEMBERS};
use std::time::Duration;
use thiserror::Error;

/// A readiness or block-progress deadline expired.
///
/// The deadline is absolute and caller-controlled; the caller decides
/// whether to retry with a longer budget.
#[derive(Debug, Error)]
#[error("timed out after {budget:?} waiting for {operation}")]
pub struct TimeoutError {
    /// What was being awaited.
    pub operation: String,
    /// The budget that expired.
    pub budget: Duration,
}

impl TimeoutError {
    pub(crate) fn new(operation: impl Into<String>, budget: Duration) -> Self {
        Self {
            operation: operation.into(),
            budget,
        }
    }
}

/// Errors from a member REST endpoint call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connection refused, request timeout,
    /// malformed body).
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("{url} returned status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Errors while launching the cluster.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Requested member count is outside the supported range. Checked
    /// before touching the container runtime.
    #[error("member count must be between {MIN_MEMBERS} and {MAX_MEMBERS}, got {0}")]
    InvalidMemberCount(usize),

    /// The container engine is unreachable. Fatal, not retried.
    #[error("container engine unavailable: {0}")]
    EnvironmentUnavailable(String),

    /// Another cluster handle is live in this process. All members bind
    /// fixed host ports, so only one cluster can run per machine.
    #[error("a cluster is already active in this process; tear it down first")]
    ClusterActive,

    /// Cluster home (genesis artifacts, key material) not found.
    #[error("cluster home not found: {0}")]
    HomeNotFound(String),

    /// Writing the generated compose file failed.
    #[error("failed to write compose file: {0}")]
    WriteCompose(#[source] std::io::Error),

    /// A `docker compose` invocation failed; partially started members
    /// have been rolled back.
    #[error("docker compose {command} failed: {stderr}")]
    Compose { command: String, stderr: String },

    /// One or more members never became ready within the budget.
    #[error("cluster failed to become ready: {0}")]
    NotReady(#[from] TimeoutError),
}

impl From<SpecError> for StartupError {
    fn from(err: SpecError) -> Self {
        match err {
            SpecError::MemberCountOutOfRange(n) => StartupError::InvalidMemberCount(n),
        }
    }
}

/// Errors from bootstrap funding or faucet transfers.
#[derive(Debug, Error)]
pub enum FundingError {
    /// `fund` was called before bootstrap completed. Programming error;
    /// nothing was submitted on-chain.
    #[error("cluster is not bootstrapped; call bootstrap() before fund()")]
    NotBootstrapped,

    /// `bootstrap` was called a second time. Funding happens exactly once
    /// per cluster lifetime.
    #[error("cluster is already bootstrapped")]
    AlreadyBootstrapped,

    /// Key material could not be loaded from the cluster home.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Target address is not valid hex.
    #[error("invalid account address {0:?}")]
    InvalidAddress(String),

    /// A member endpoint call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The chain rejected the transfer; carries the on-chain result.
    #[error("transfer {hash} rejected: {reason}")]
    Rejected { hash: String, reason: String },

    /// The transfer was submitted but not included within the budget.
    #[error(transparent)]
    Inclusion(#[from] TimeoutError),
}

/// Errors during resource reclamation.
#[derive(Debug, Error)]
pub enum TeardownError {
    /// A `docker compose` invocation failed during teardown. Logged and
    /// escalated to forced removal, never silently swallowed.
    #[error("docker compose {command} failed during teardown: {stderr}")]
    Compose { command: String, stderr: String },

    /// Teardown state could not be prepared (e.g. the compose file could
    /// not be rewritten for a purge).
    #[error("failed to prepare teardown: {0}")]
    Prepare(String),
}
