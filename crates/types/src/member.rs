//! Per-member handle.

use crate::ports::{member_address, PortLayout};
use std::path::PathBuf;

/// Handle for one validator member of the cluster.
///
/// Created during supervisor startup and destroyed at teardown. The key
/// material path is used only for the bootstrap funding step and never
/// exposed to tests.
#[derive(Clone, Debug)]
pub struct MemberHandle {
    /// Ordinal index within the cluster.
    pub index: usize,
    /// Static container address on the cluster network.
    pub address: String,
    /// Assigned host port block.
    pub ports: PortLayout,
    /// Path to this member's `private-keys.yaml` in the cluster home.
    pub key_path: PathBuf,
}

impl MemberHandle {
    /// Create the handle for the member at `index`.
    pub fn new(index: usize, subnet: &str, key_path: PathBuf) -> Self {
        Self {
            index,
            address: member_address(subnet, index),
            ports: PortLayout::for_member(index),
            key_path,
        }
    }

    /// REST API base URL, reachable from the host.
    pub fn api_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.ports.api)
    }

    /// Metrics base URL, reachable from the host.
    pub fn metrics_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.ports.metrics)
    }
}
