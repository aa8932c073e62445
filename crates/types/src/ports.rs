//! Deterministic per-member port and address assignment.
//!
//! Every member gets a statically computed, non-overlapping block of host
//! ports derived from its ordinal index, so "port already in use" failures
//! can be diagnosed from this table alone:
//!
//! | member | REST API | peer-to-peer | metrics | container IP     |
//! |--------|----------|--------------|---------|------------------|
//! | 0      | 8080     | 6180         | 9101    | `<subnet>.10`    |
//! | 1      | 8081     | 6181         | 9102    | `<subnet>.11`    |
//! | i      | 8080+i   | 6180+i       | 9101+i  | `<subnet>.10+i`  |

/// Base host port for the validator REST API.
pub const BASE_API_PORT: u16 = 8080;

/// Base host port for the validator peer-to-peer network.
pub const BASE_PEER_PORT: u16 = 6180;

/// Base host port for the validator metrics endpoint.
pub const BASE_METRICS_PORT: u16 = 9101;

/// First host octet assigned to a member container.
const BASE_MEMBER_OCTET: u8 = 10;

/// The port block assigned to one member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortLayout {
    /// REST API port (host and container).
    pub api: u16,
    /// Peer-to-peer port (host and container).
    pub peer: u16,
    /// Metrics port (host and container).
    pub metrics: u16,
}

impl PortLayout {
    /// Compute the port block for the member at `index`.
    pub fn for_member(index: usize) -> Self {
        Self {
            api: BASE_API_PORT + index as u16,
            peer: BASE_PEER_PORT + index as u16,
            metrics: BASE_METRICS_PORT + index as u16,
        }
    }
}

/// Static container address for the member at `index` within `subnet`
/// (first three octets, e.g. `"172.28.0"`).
pub fn member_address(subnet: &str, index: usize) -> String {
    format!("{}.{}", subnet, BASE_MEMBER_OCTET as usize + index)
}
