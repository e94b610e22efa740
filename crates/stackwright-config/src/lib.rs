//! # stackwright-config
//!
//! Typed configuration model for Stackwright.
//!
//! Handles:
//! - **Model**: Immutable, validated per-environment and global settings.
//! - **Document**: Raw YAML document shapes as written by operators.
//! - **Validator**: Conversion of documents into the typed model.
//! - **Loader**: Reading documents from a config directory.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod document;
pub mod loader;
pub mod model;
pub mod validator;

pub use model::{
    ComputeConfig, ContainerConfig, DeploymentStrategy, EnvironmentConfig, GateCommands,
    GlobalConfig, HealthCheckConfig, ListenerPorts, LoadBalancerConfig, NetworkConfig,
    NetworkRef, NetworkSelector, ServiceConfig, SourceConfig,
};
