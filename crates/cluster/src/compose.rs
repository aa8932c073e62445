//! Docker Compose file generation.
//!
//! The compose file is rendered from the `ClusterSpec` on every startup so
//! the on-disk state always matches the requested cluster shape. Inside the
//! container each validator listens on the fixed base ports; the unique
//! per-member host ports from the port table are mapped onto them.

use localnet_types::{
    member_address, ClusterSpec, PortLayout, BASE_API_PORT, BASE_METRICS_PORT, BASE_PEER_PORT,
    LOCAL_CHAIN_ID,
};
use std::fmt::Write;

/// Compose project name; also the bridge network name.
pub const PROJECT: &str = "localnet";

/// Container name of the member at `index`.
pub fn container_name(index: usize) -> String {
    format!("{PROJECT}-validator-{index}")
}

/// Render the compose file for `spec`.
pub fn render(spec: &ClusterSpec) -> String {
    let mut out = String::new();

    writeln!(out, "# Generated by localnet; do not edit.").unwrap();
    writeln!(out, "name: {PROJECT}").unwrap();
    writeln!(out).unwrap();

    writeln!(out, "networks:").unwrap();
    writeln!(out, "  {PROJECT}:").unwrap();
    writeln!(out, "    driver: bridge").unwrap();
    writeln!(out, "    ipam:").unwrap();
    writeln!(out, "      config:").unwrap();
    writeln!(out, "        - subnet: {}.0/24", spec.subnet).unwrap();
    writeln!(out).unwrap();

    writeln!(out, "volumes:").unwrap();
    for i in 0..spec.num_members {
        writeln!(out, "  {}-data:", container_name(i)).unwrap();
    }
    writeln!(out).unwrap();

    writeln!(out, "services:").unwrap();
    for i in 0..spec.num_members {
        let ports = PortLayout::for_member(i);
        writeln!(out, "  validator-{i}:").unwrap();
        writeln!(out, "    container_name: {}", container_name(i)).unwrap();
        writeln!(out, "    image: {}", spec.image).unwrap();
        writeln!(out, "    restart: \"no\"").unwrap();
        writeln!(out, "    environment:").unwrap();
        writeln!(out, "      - NODE_INDEX={i}").unwrap();
        writeln!(out, "      - CHAIN_ID={LOCAL_CHAIN_ID}").unwrap();
        writeln!(out, "    ports:").unwrap();
        writeln!(out, "      - \"{}:{}\"", ports.api, BASE_API_PORT).unwrap();
        writeln!(out, "      - \"{}:{}\"", ports.peer, BASE_PEER_PORT).unwrap();
        writeln!(out, "      - \"{}:{}\"", ports.metrics, BASE_METRICS_PORT).unwrap();
        writeln!(out, "    volumes:").unwrap();
        writeln!(
            out,
            "      - ./validators/validator-{i}:/opt/validator/config:ro"
        )
        .unwrap();
        writeln!(out, "      - {}-data:/opt/validator/data", container_name(i)).unwrap();
        writeln!(out, "    networks:").unwrap();
        writeln!(out, "      {PROJECT}:").unwrap();
        writeln!(out, "        ipv4_address: {}", member_address(&spec.subnet, i)).unwrap();
        writeln!(out).unwrap();
    }

    out
}
