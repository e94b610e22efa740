//! Shared helpers for the structural gate tests.
//!
//! Every helper reads the checked-in `configs/` directory, so a gate fails
//! as soon as a config change breaks the expected structure.

#![allow(dead_code, clippy::expect_used, clippy::panic)]

use std::path::PathBuf;

use stackwright_common::types::EnvironmentName;
use stackwright_config::loader::ConfigLoader;
use stackwright_config::{EnvironmentConfig, GlobalConfig};
use stackwright_topology::lookup::InMemoryDirectory;
use stackwright_topology::stack::{synthesize_network_stack, synthesize_service_stack};
use stackwright_topology::{NetworkTopology, TopologyGraph};

/// The workspace's config directory.
pub fn configs_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs")
}

pub fn loader() -> ConfigLoader {
    ConfigLoader::new(configs_dir())
}

pub fn global() -> GlobalConfig {
    loader().load_global().expect("global config should load")
}

pub fn environment(name: EnvironmentName) -> EnvironmentConfig {
    loader()
        .load_environment(name)
        .unwrap_or_else(|e| panic!("{name} config should load: {e}"))
}

pub fn all_environments() -> Vec<EnvironmentConfig> {
    loader()
        .load_environments(&EnvironmentName::ALL)
        .expect("all configs should load")
}

pub fn network_stack(name: EnvironmentName) -> NetworkTopology {
    synthesize_network_stack(&environment(name)).expect("network stack should synthesize")
}

/// Synthesizes the service stack against the environment's own network.
pub fn service_stack(name: EnvironmentName) -> TopologyGraph {
    let config = environment(name);
    let mut directory = InMemoryDirectory::new();
    let network = synthesize_network_stack(&config).expect("network stack should synthesize");
    directory.register_environment(&config, network);
    synthesize_service_stack(&config, &directory).expect("service stack should synthesize")
}
