//! Validated configuration values.
//!
//! Values in this module are only produced by [`crate::validator`] (or built
//! directly by callers that already hold typed data) and are never mutated
//! afterwards.

use std::collections::BTreeMap;

use serde::Serialize;
use stackwright_common::constants::{DEFAULT_PRODUCTION_PORT, DEFAULT_TEST_PORT};
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::{EnvironmentName, ServiceDomain};

/// Complete settings of one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentConfig {
    /// Environment these settings belong to.
    pub name: EnvironmentName,
    /// Addressing of the generated network.
    pub network: NetworkConfig,
    /// Task and service settings.
    pub compute: ComputeConfig,
    /// Release strategy.
    pub deployment: DeploymentStrategy,
    /// Existing network and load balancer the service is placed into.
    pub network_ref: NetworkRef,
}

/// Addressing settings for the Network Topology Builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    /// Number of availability zones to spread subnets across.
    pub max_availability_zones: u32,
    /// NAT gateways to provision. Zero removes the application tier.
    pub nat_gateway_count: u32,
    /// Whether public subnets receive IPv6 addressing.
    pub ipv6_enabled: bool,
}

impl NetworkConfig {
    /// Whether the network has a private application subnet tier.
    #[must_use]
    pub const fn has_application_tier(&self) -> bool {
        self.nat_gateway_count != 0
    }
}

/// Task definition and service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeConfig {
    /// Task memory in MiB.
    pub memory_mib: u32,
    /// Task CPU units.
    pub cpu_units: u32,
    /// Task definition family.
    pub family_name: String,
    /// Role used to pull images and write logs.
    pub execution_role_arn: String,
    /// Managed policies attached to the task role.
    pub task_role_policies: Vec<String>,
    /// The single task container.
    pub container: ContainerConfig,
    /// Scalable service settings.
    pub service: ServiceConfig,
}

/// The task's container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerConfig {
    /// Container name.
    pub name: String,
    /// Environment variables, ordered by key.
    pub environment_variables: BTreeMap<String, String>,
}

/// Scaling and placement of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceConfig {
    /// Number of tasks to keep running.
    pub desired_count: u32,
    /// Lower bound of running tasks during a deployment, in percent.
    pub min_healthy_percent: u32,
    /// Upper bound of running tasks during a deployment, in percent.
    pub max_healthy_percent: u32,
    /// Place tasks in public subnets with public addresses.
    pub assign_public_ip: bool,
}

/// How a new version reaches production traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy")]
pub enum DeploymentStrategy {
    /// Replace tasks in place behind a single listener.
    RollingUpdate {
        /// Roll back automatically when a deployment fails.
        circuit_breaker_rollback: bool,
    },
    /// Keep production and test listeners for an external controller to swap.
    BlueGreen,
}

impl DeploymentStrategy {
    /// Accepted strategy names.
    pub const NAMES: [&'static str; 2] = ["RollingUpdate", "BlueGreen"];

    /// Builds the tagged strategy from its document name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a missing or unknown name.
    pub fn from_name(name: Option<&str>, circuit_breaker_rollback: bool) -> Result<Self> {
        match name {
            Some("RollingUpdate") => Ok(Self::RollingUpdate {
                circuit_breaker_rollback,
            }),
            Some("BlueGreen") => Ok(Self::BlueGreen),
            Some(other) => Err(StackwrightError::config(
                "deployment.strategy",
                format!("one of RollingUpdate, BlueGreen (got \"{other}\")"),
            )),
            None => Err(StackwrightError::config(
                "deployment.strategy",
                "one of RollingUpdate, BlueGreen (field is required)",
            )),
        }
    }

    /// Returns the document name of the strategy.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RollingUpdate { .. } => "RollingUpdate",
            Self::BlueGreen => "BlueGreen",
        }
    }
}

/// Existing resources the service attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkRef {
    /// How the network is found.
    pub network: NetworkSelector,
    /// The shared load balancer.
    pub load_balancer: LoadBalancerConfig,
}

/// Selects which network a lookup resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NetworkSelector {
    /// A specific network by ID.
    ById(String),
    /// The account's default network.
    Default,
}

impl NetworkSelector {
    /// Maps an optional ID to a selector; empty means the default network.
    #[must_use]
    pub fn from_vpc_id(vpc_id: Option<&str>) -> Self {
        match vpc_id.map(str::trim) {
            Some(id) if !id.is_empty() => Self::ById(id.to_string()),
            _ => Self::Default,
        }
    }
}

/// Listener and target-group settings on the shared load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadBalancerConfig {
    /// ARN of the load balancer.
    pub arn: String,
    /// Certificate bound to the production listener, if any.
    pub certificate_arn: Option<String>,
    /// Target-group health check.
    pub health_check: HealthCheckConfig,
    /// Seconds to drain deregistering targets.
    pub deregistration_delay_seconds: u32,
    /// Listener ports.
    pub listener_ports: ListenerPorts,
}

/// Target-group health-check settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheckConfig {
    /// Whether health checks run.
    pub enabled: bool,
    /// Seconds between checks.
    pub interval_seconds: u32,
    /// Path requested on each target.
    pub path: String,
    /// Seconds before a check times out.
    pub timeout_seconds: u32,
    /// Consecutive successes before a target is healthy.
    pub healthy_threshold: u32,
    /// Consecutive failures before a target is unhealthy.
    pub unhealthy_threshold: u32,
}

/// Ports of the production and test listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListenerPorts {
    /// Production listener port.
    pub production: u16,
    /// Blue-green test listener port.
    pub test: u16,
}

impl Default for ListenerPorts {
    fn default() -> Self {
        Self {
            production: DEFAULT_PRODUCTION_PORT,
            test: DEFAULT_TEST_PORT,
        }
    }
}

/// Settings shared by every pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalConfig {
    /// Toolchain version pinned in synth and self-mutation steps.
    pub toolchain_version: String,
    /// Region every stage deploys to.
    pub region: String,
    /// Target account per environment.
    pub accounts: BTreeMap<EnvironmentName, String>,
    /// Repository the pipelines build from.
    pub source: SourceConfig,
    /// Domains with an active pipeline.
    pub pipelines: Vec<ServiceDomain>,
    /// Promotion order per domain.
    pub promotion: BTreeMap<ServiceDomain, Vec<EnvironmentName>>,
    /// Commands run by validation gates.
    pub gate: GateCommands,
}

impl GlobalConfig {
    /// Returns the promotion order configured for `domain`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the domain has no order.
    pub fn promotion_order(&self, domain: ServiceDomain) -> Result<&[EnvironmentName]> {
        self.promotion
            .get(&domain)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                StackwrightError::config(
                    format!("promotion.{domain}"),
                    "a list of environments to promote through",
                )
            })
    }

    /// Returns the account of `environment`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no account is configured.
    pub fn account(&self, environment: EnvironmentName) -> Result<&str> {
        self.accounts
            .get(&environment)
            .map(String::as_str)
            .ok_or_else(|| StackwrightError::config(format!("accounts.{environment}"), "an account ID"))
    }
}

/// Source repository of the pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceConfig {
    /// `owner/name` of the repository.
    pub repository: String,
    /// Branch that triggers the pipelines.
    pub branch: String,
    /// Connection used to reach the repository.
    pub connection_arn: String,
}

/// Commands executed by a validation gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateCommands {
    /// Installs dependencies before the test runs.
    pub install: String,
    /// Test command; `{target}` is replaced by the test selector.
    pub test_template: String,
}

impl GateCommands {
    /// Placeholder substituted with the test target.
    pub const TARGET_PLACEHOLDER: &'static str = "{target}";

    /// Renders the test command for `target`.
    #[must_use]
    pub fn test_command(&self, target: &str) -> String {
        self.test_template.replace(Self::TARGET_PLACEHOLDER, target)
    }
}

impl Default for GateCommands {
    fn default() -> Self {
        Self {
            install: "cargo fetch --locked".into(),
            test_template: "cargo test --locked -p stackwright-pipeline --test {target}".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_from_known_names() {
        assert_eq!(
            DeploymentStrategy::from_name(Some("RollingUpdate"), true).unwrap(),
            DeploymentStrategy::RollingUpdate {
                circuit_breaker_rollback: true
            }
        );
        assert_eq!(
            DeploymentStrategy::from_name(Some("BlueGreen"), true).unwrap(),
            DeploymentStrategy::BlueGreen
        );
    }

    #[test]
    fn strategy_rejects_unknown_name() {
        let err = DeploymentStrategy::from_name(Some("Canary"), false).unwrap_err();
        assert!(err.is_config());
        let msg = err.to_string();
        assert!(msg.contains("deployment.strategy"), "got: {msg}");
        assert!(msg.contains("Canary"), "got: {msg}");
    }

    #[test]
    fn strategy_is_required() {
        let err = DeploymentStrategy::from_name(None, false).unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn empty_vpc_id_selects_default_network() {
        assert_eq!(NetworkSelector::from_vpc_id(None), NetworkSelector::Default);
        assert_eq!(NetworkSelector::from_vpc_id(Some("")), NetworkSelector::Default);
        assert_eq!(NetworkSelector::from_vpc_id(Some("  ")), NetworkSelector::Default);
        assert_eq!(
            NetworkSelector::from_vpc_id(Some("vpc-0abc")),
            NetworkSelector::ById("vpc-0abc".into())
        );
    }

    #[test]
    fn gate_test_command_substitutes_target() {
        let gate = GateCommands::default();
        assert_eq!(
            gate.test_command("network_dev"),
            "cargo test --locked -p stackwright-pipeline --test network_dev"
        );
    }

    #[test]
    fn application_tier_follows_nat_count() {
        let mut network = NetworkConfig {
            max_availability_zones: 2,
            nat_gateway_count: 0,
            ipv6_enabled: false,
        };
        assert!(!network.has_application_tier());
        network.nat_gateway_count = 1;
        assert!(network.has_application_tier());
    }
}
