//! Raw configuration documents as written in YAML.
//!
//! These shapes mirror the files under `configs/` field for field. They carry
//! no invariants; [`crate::validator`] turns them into the typed model.

use std::collections::BTreeMap;

use serde::Deserialize;
use stackwright_common::types::ServiceDomain;

/// One environment's document (`configs/<env>.yml`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnvironmentDocument {
    /// `network` section.
    pub network: NetworkDocument,
    /// `compute` section.
    pub compute: ComputeDocument,
    /// `deployment` section; a missing section is rejected by the validator.
    #[serde(default)]
    pub deployment: DeploymentDocument,
    /// `networkRef` section.
    pub network_ref: NetworkRefDocument,
}

/// `network` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NetworkDocument {
    /// `network.addressing`.
    pub addressing: AddressingDocument,
}

/// `network.addressing` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddressingDocument {
    /// `maxAvailabilityZones`.
    pub max_availability_zones: u32,
    /// `natGatewayCount`.
    pub nat_gateway_count: u32,
    /// `ipv6Enabled`.
    #[serde(default)]
    pub ipv6_enabled: bool,
}

/// `compute` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComputeDocument {
    /// `memoryMiB`.
    #[serde(rename = "memoryMiB")]
    pub memory_mib: u32,
    /// `cpuUnits`.
    pub cpu_units: u32,
    /// `familyName`.
    pub family_name: String,
    /// `executionRoleArn`.
    pub execution_role_arn: String,
    /// `taskRolePolicies`.
    #[serde(default)]
    pub task_role_policies: Vec<String>,
    /// `container`.
    pub container: ContainerDocument,
    /// `service`.
    pub service: ServiceDocument,
}

/// `compute.container` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContainerDocument {
    /// `name`.
    pub name: String,
    /// `environmentVariables`.
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
}

/// `compute.service` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceDocument {
    /// `desiredCount`.
    pub desired_count: u32,
    /// `minHealthyPercent`.
    pub min_healthy_percent: u32,
    /// `maxHealthyPercent`.
    pub max_healthy_percent: u32,
    /// `circuitBreakerRollback`.
    #[serde(default)]
    pub circuit_breaker_rollback: bool,
    /// `assignPublicIp`.
    #[serde(default)]
    pub assign_public_ip: bool,
}

/// `deployment` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeploymentDocument {
    /// `strategy`; required, checked by the validator.
    #[serde(default)]
    pub strategy: Option<String>,
}

/// `networkRef` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NetworkRefDocument {
    /// `vpcId`; empty or absent selects the default network.
    #[serde(default)]
    pub vpc_id: Option<String>,
    /// `loadBalancer`.
    pub load_balancer: LoadBalancerDocument,
}

/// `networkRef.loadBalancer` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoadBalancerDocument {
    /// `arn`.
    pub arn: String,
    /// `certificateArn`.
    #[serde(default)]
    pub certificate_arn: Option<String>,
    /// `healthCheck`.
    pub health_check: HealthCheckDocument,
    /// `deregistrationDelaySeconds`.
    pub deregistration_delay_seconds: u32,
    /// `listenerPorts`.
    #[serde(default)]
    pub listener_ports: Option<ListenerPortsDocument>,
}

/// `networkRef.loadBalancer.healthCheck` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HealthCheckDocument {
    /// `enabled`.
    pub enabled: bool,
    /// `intervalSeconds`.
    pub interval_seconds: u32,
    /// `path`.
    pub path: String,
    /// `timeoutSeconds`.
    pub timeout_seconds: u32,
    /// `healthyThreshold`.
    pub healthy_threshold: u32,
    /// `unhealthyThreshold`.
    pub unhealthy_threshold: u32,
}

/// `networkRef.loadBalancer.listenerPorts` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListenerPortsDocument {
    /// `production`.
    #[serde(default)]
    pub production: Option<u16>,
    /// `test`.
    #[serde(default)]
    pub test: Option<u16>,
}

/// The global document (`configs/global.yml`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GlobalDocument {
    /// `toolchainVersion`.
    pub toolchain_version: String,
    /// `region`.
    pub region: String,
    /// `accounts`, keyed by environment name as written.
    pub accounts: BTreeMap<String, String>,
    /// `source`.
    pub source: SourceDocument,
    /// `pipelines`; defaults to the network pipeline only.
    #[serde(default)]
    pub pipelines: Option<Vec<ServiceDomain>>,
    /// `promotion`; merged over the default orders.
    #[serde(default)]
    pub promotion: BTreeMap<ServiceDomain, Vec<String>>,
    /// `gate`.
    #[serde(default)]
    pub gate: GateDocument,
}

/// `source` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceDocument {
    /// `repository`.
    pub repository: String,
    /// `branch`.
    pub branch: String,
    /// `connectionArn`.
    pub connection_arn: String,
}

/// `gate` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GateDocument {
    /// `installCommand`.
    #[serde(default)]
    pub install_command: Option<String>,
    /// `testCommand`.
    #[serde(default)]
    pub test_command: Option<String>,
}
