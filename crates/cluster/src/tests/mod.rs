//! In-crate tests that exercise the orchestrator against fake member
//! endpoints, without a container engine.
//!
//! Docker-gated end-to-end tests live in `tests/cluster_test.rs`.

pub mod support;

mod funding;
