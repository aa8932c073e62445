//! Cluster configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Chain id reported by validators on a local test network.
///
/// Readiness probing requires every member to report this value; a member
/// answering with anything else is a stale container from an unrelated
/// process squatting on our ports.
pub const LOCAL_CHAIN_ID: u8 = 4;

/// Minimum supported cluster size.
pub const MIN_MEMBERS: usize = 1;

/// Maximum supported cluster size.
///
/// Bounded by the fixed host-port table: member `i` binds `8080 + i`,
/// `6180 + i` and `9101 + i`, so sizes beyond this start colliding with
/// unrelated services.
pub const MAX_MEMBERS: usize = 7;

/// Errors from cluster configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// Member count outside the supported inclusive range.
    #[error("member count must be between {MIN_MEMBERS} and {MAX_MEMBERS}, got {0}")]
    MemberCountOutOfRange(usize),
}

/// Immutable configuration for one cluster, chosen at creation.
#[derive(Clone, Debug)]
pub struct ClusterSpec {
    /// Number of validator members to launch.
    pub num_members: usize,

    /// Container image reference for the validator binary.
    pub image: String,

    /// Explicit cluster home directory (genesis artifacts and key material).
    ///
    /// When `None`, the home is discovered from `LOCALNET_HOME` or a set of
    /// well-known candidate paths.
    pub home: Option<PathBuf>,

    /// First three octets of the cluster bridge network, e.g. `"172.28.0"`.
    /// Member `i` is assigned the static address `<subnet>.10 + i`.
    pub subnet: String,

    /// Budget for all members to become ready after startup.
    pub readiness_timeout: Duration,

    /// Interval between status polls (readiness and block waits).
    pub poll_interval: Duration,

    /// Per-request timeout for member endpoint calls.
    pub request_timeout: Duration,

    /// Budget for graceful container stop before escalating to forced
    /// removal.
    pub stop_budget: Duration,

    /// Maximum height spread between members still considered "in sync".
    pub sync_tolerance: u64,
}

impl ClusterSpec {
    /// Create a spec for a cluster of `num_members` validators.
    pub fn new(num_members: usize) -> Self {
        Self {
            num_members,
            image: "localnet-validator:latest".to_string(),
            home: None,
            subnet: "172.28.0".to_string(),
            readiness_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(3),
            stop_budget: Duration::from_secs(10),
            sync_tolerance: 10,
        }
    }

    /// Set the container image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Set an explicit cluster home directory.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Set the readiness budget.
    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = timeout;
        self
    }

    /// Set the status poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the per-request timeout for member endpoint calls.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the graceful-stop budget.
    pub fn with_stop_budget(mut self, budget: Duration) -> Self {
        self.stop_budget = budget;
        self
    }

    /// Set the in-sync height spread tolerance.
    pub fn with_sync_tolerance(mut self, tolerance: u64) -> Self {
        self.sync_tolerance = tolerance;
        self
    }

    /// Validate the spec without touching the container runtime.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.num_members < MIN_MEMBERS || self.num_members > MAX_MEMBERS {
            return Err(SpecError::MemberCountOutOfRange(self.num_members));
        }
        Ok(())
    }
}

impl Default for ClusterSpec {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_is_valid() {
        let spec = ClusterSpec::default();
        assert_eq!(spec.num_members, 4);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_member_count_bounds() {
        assert!(ClusterSpec::new(MIN_MEMBERS).validate().is_ok());
        assert!(ClusterSpec::new(MAX_MEMBERS).validate().is_ok());

        let err = ClusterSpec::new(0).validate().unwrap_err();
        assert!(matches!(err, SpecError::MemberCountOutOfRange(0)));

        let err = ClusterSpec::new(8).validate().unwrap_err();
        assert!(matches!(err, SpecError::MemberCountOutOfRange(8)));
    }

    #[test]
    fn test_builder_setters() {
        let spec = ClusterSpec::new(2)
            .with_image("validator:dev")
            .with_sync_tolerance(3)
            .with_readiness_timeout(Duration::from_secs(30));

        assert_eq!(spec.image, "validator:dev");
        assert_eq!(spec.sync_tolerance, 3);
        assert_eq!(spec.readiness_timeout, Duration::from_secs(30));
    }
}
