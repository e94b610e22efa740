//! Resource node and edge types of a topology graph.

use std::collections::BTreeMap;
use std::fmt;

use ipnet::Ipv4Net;
use serde::Serialize;
use stackwright_common::types::ResourceId;

/// A node of a topology graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Logical identifier, unique within one graph.
    pub id: ResourceId,
    /// What the resource is and how it is configured.
    pub kind: ResourceKind,
}

impl Resource {
    /// Creates a resource.
    pub fn new(id: impl Into<ResourceId>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Relationship between two resources.
///
/// An edge `a -> b` reads "a <relation> b", and `b` must exist before `a`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Relation {
    /// `a` is placed in or bound to `b`.
    AttachesTo,
    /// `a` forwards traffic to `b`.
    RoutesTo,
    /// `a` must be created after `b` with no other relationship.
    DependsOn,
    /// `a` pulls its image from `b`.
    PullsFrom,
    /// `a` writes logs to `b`.
    LogsTo,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AttachesTo => "attaches to",
            Self::RoutesTo => "routes to",
            Self::DependsOn => "depends on",
            Self::PullsFrom => "pulls from",
            Self::LogsTo => "logs to",
        };
        f.write_str(name)
    }
}

/// Every kind of resource the composer emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "properties")]
pub enum ResourceKind {
    /// Virtual network.
    Network(NetworkSpec),
    /// Subnet in one availability zone.
    Subnet(SubnetSpec),
    /// Internet gateway of the public tier.
    InternetGateway,
    /// NAT gateway serving the application tier.
    NatGateway(NatGatewaySpec),
    /// Provider-assigned IPv6 block at network scope.
    Ipv6Block(Ipv6BlockSpec),
    /// One /64 of the network IPv6 block assigned to a subnet.
    SubnetIpv6Assignment(SubnetIpv6Spec),
    /// Application load balancer.
    LoadBalancer(LoadBalancerSpec),
    /// Container image repository.
    Repository(RepositorySpec),
    /// Log sink for container output.
    LogGroup(LogGroupSpec),
    /// Compute cluster.
    Cluster,
    /// Task definition with its single container.
    TaskDefinition(TaskDefinitionSpec),
    /// Scalable service running the task definition.
    Service(ServiceSpec),
    /// Load-balancer listener.
    Listener(ListenerSpec),
    /// Listener rule.
    ListenerRule(ListenerRuleSpec),
    /// Target group behind a listener.
    TargetGroup(TargetGroupSpec),
    /// A resource owned by another graph or looked up from the account.
    Imported(ImportedSpec),
}

impl ResourceKind {
    /// Short type name used in logs and plans.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Network(_) => "Network",
            Self::Subnet(_) => "Subnet",
            Self::InternetGateway => "InternetGateway",
            Self::NatGateway(_) => "NatGateway",
            Self::Ipv6Block(_) => "Ipv6Block",
            Self::SubnetIpv6Assignment(_) => "SubnetIpv6Assignment",
            Self::LoadBalancer(_) => "LoadBalancer",
            Self::Repository(_) => "Repository",
            Self::LogGroup(_) => "LogGroup",
            Self::Cluster => "Cluster",
            Self::TaskDefinition(_) => "TaskDefinition",
            Self::Service(_) => "Service",
            Self::Listener(_) => "Listener",
            Self::ListenerRule(_) => "ListenerRule",
            Self::TargetGroup(_) => "TargetGroup",
            Self::Imported(_) => "Imported",
        }
    }

    /// Whether the node stands in for a resource owned elsewhere.
    #[must_use]
    pub const fn is_imported(&self) -> bool {
        matches!(self, Self::Imported(_))
    }

    /// Returns the subnet spec, if this is a subnet.
    #[must_use]
    pub const fn as_subnet(&self) -> Option<&SubnetSpec> {
        match self {
            Self::Subnet(spec) => Some(spec),
            _ => None,
        }
    }

    /// Returns the IPv6 assignment spec, if this is one.
    #[must_use]
    pub const fn as_ipv6_assignment(&self) -> Option<&SubnetIpv6Spec> {
        match self {
            Self::SubnetIpv6Assignment(spec) => Some(spec),
            _ => None,
        }
    }

    /// Returns the NAT gateway spec, if this is one.
    #[must_use]
    pub const fn as_nat_gateway(&self) -> Option<&NatGatewaySpec> {
        match self {
            Self::NatGateway(spec) => Some(spec),
            _ => None,
        }
    }

    /// Returns the load balancer spec, if this is one.
    #[must_use]
    pub const fn as_load_balancer(&self) -> Option<&LoadBalancerSpec> {
        match self {
            Self::LoadBalancer(spec) => Some(spec),
            _ => None,
        }
    }

    /// Returns the task definition spec, if this is one.
    #[must_use]
    pub const fn as_task_definition(&self) -> Option<&TaskDefinitionSpec> {
        match self {
            Self::TaskDefinition(spec) => Some(spec),
            _ => None,
        }
    }

    /// Returns the service spec, if this is a service.
    #[must_use]
    pub const fn as_service(&self) -> Option<&ServiceSpec> {
        match self {
            Self::Service(spec) => Some(spec),
            _ => None,
        }
    }

    /// Returns the listener spec, if this is a listener.
    #[must_use]
    pub const fn as_listener(&self) -> Option<&ListenerSpec> {
        match self {
            Self::Listener(spec) => Some(spec),
            _ => None,
        }
    }

    /// Returns the listener rule spec, if this is one.
    #[must_use]
    pub const fn as_listener_rule(&self) -> Option<&ListenerRuleSpec> {
        match self {
            Self::ListenerRule(spec) => Some(spec),
            _ => None,
        }
    }

    /// Returns the target group spec, if this is one.
    #[must_use]
    pub const fn as_target_group(&self) -> Option<&TargetGroupSpec> {
        match self {
            Self::TargetGroup(spec) => Some(spec),
            _ => None,
        }
    }

    /// Returns the imported spec, if this is an imported reference.
    #[must_use]
    pub const fn as_imported(&self) -> Option<&ImportedSpec> {
        match self {
            Self::Imported(spec) => Some(spec),
            _ => None,
        }
    }
}

/// Virtual network settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    /// IPv4 block of the network.
    pub cidr: Ipv4Net,
    /// Availability zones spanned.
    pub max_availability_zones: u32,
    /// NAT gateways provisioned.
    pub nat_gateways: u32,
    /// Whether an IPv6 block is associated.
    pub dual_stack: bool,
}

/// Subnet tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetTier {
    /// Public subnets reachable from the internet.
    Ingress,
    /// Isolated subnets with no route out.
    Data,
    /// Private subnets egressing through NAT.
    Application,
}

impl SubnetTier {
    /// Returns the tier name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ingress => stackwright_common::constants::INGRESS_TIER,
            Self::Data => stackwright_common::constants::DATA_TIER,
            Self::Application => stackwright_common::constants::APPLICATION_TIER,
        }
    }

    /// Returns the prefix length of subnets in this tier.
    #[must_use]
    pub const fn cidr_mask(self) -> u8 {
        match self {
            Self::Ingress => stackwright_common::constants::INGRESS_CIDR_MASK,
            Self::Data => stackwright_common::constants::DATA_CIDR_MASK,
            Self::Application => stackwright_common::constants::APPLICATION_CIDR_MASK,
        }
    }

    /// Whether subnets in this tier route directly to the internet.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Ingress)
    }

    const fn title(self) -> &'static str {
        match self {
            Self::Ingress => "Ingress",
            Self::Data => "Data",
            Self::Application => "Application",
        }
    }

    /// Logical ID of the subnet in zone `zone` (zero-based).
    #[must_use]
    pub fn subnet_id(self, zone: u32) -> ResourceId {
        ResourceId::new(format!("Vpc{}Subnet{}", self.title(), zone + 1))
    }
}

impl fmt::Display for SubnetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Subnet settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    /// Tier the subnet belongs to.
    pub tier: SubnetTier,
    /// Zero-based availability zone index.
    pub zone: u32,
    /// IPv4 block of the subnet.
    pub cidr: Ipv4Net,
    /// Whether instances receive public IPv4 addresses on launch.
    pub map_public_ip: bool,
}

/// NAT gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NatGatewaySpec {
    /// Zone of the public subnet hosting the gateway.
    pub zone: u32,
}

/// Network-scope IPv6 block settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ipv6BlockSpec {
    /// The block is allocated by the provider, not supplied.
    pub provider_assigned: bool,
}

/// Per-subnet IPv6 assignment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetIpv6Spec {
    /// Subnet receiving the block.
    pub subnet: ResourceId,
    /// Index of the partition selected for this subnet.
    pub selection_index: usize,
    /// Number of equal partitions the network block is cut into.
    pub partitions: usize,
    /// Prefix length of each partition.
    pub prefix_length: u8,
}

/// IP address families a load balancer listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IpAddressType {
    /// IPv4 only.
    Ipv4,
    /// IPv4 and IPv6.
    DualStack,
}

/// Load balancer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    /// Whether the load balancer has public addresses.
    pub internet_facing: bool,
    /// Address families.
    pub ip_address_type: IpAddressType,
}

/// What happens to a resource when its stack is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemovalPolicy {
    /// Delete the resource with the stack.
    Destroy,
    /// Keep the resource after the stack is gone.
    Retain,
}

/// Image repository settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySpec {
    /// Removal behavior.
    pub removal_policy: RemovalPolicy,
}

/// Log group settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroupSpec {
    /// Prefix of every log stream.
    pub stream_prefix: String,
}

/// Container-to-host port mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMapping {
    /// Port inside the container.
    pub container_port: u16,
    /// Port on the host.
    pub host_port: u16,
}

/// The single container of a task definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    /// Container name.
    pub name: String,
    /// Environment variables.
    pub environment: BTreeMap<String, String>,
    /// Port mappings.
    pub port_mappings: Vec<PortMapping>,
}

/// Task definition settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinitionSpec {
    /// Family name.
    pub family: String,
    /// Memory in MiB.
    pub memory_mib: u32,
    /// CPU units.
    pub cpu_units: u32,
    /// Execution role.
    pub execution_role_arn: String,
    /// Managed policies of the task role.
    pub task_role_policies: Vec<String>,
    /// The container.
    pub container: ContainerSpec,
}

/// Who drives deployments of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all_fields = "camelCase")]
pub enum DeploymentController {
    /// The service replaces its own tasks.
    Rolling {
        /// Roll back automatically on a failed deployment.
        circuit_breaker_rollback: bool,
    },
    /// An external orchestrator shifts traffic between listeners.
    External(ExternalController),
}

/// External deployment orchestrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExternalController {
    /// Blue-green deployments driven by `CodeDeploy`.
    CodeDeploy,
}

/// Service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    /// Tasks to keep running.
    pub desired_count: u32,
    /// Minimum healthy percent during deployments.
    pub min_healthy_percent: u32,
    /// Maximum percent during deployments.
    pub max_healthy_percent: u32,
    /// Seconds load-balancer health checks are ignored after a task starts.
    pub health_check_grace_period_seconds: u32,
    /// Whether tasks get public IPv4 addresses.
    pub assign_public_ip: bool,
    /// Tier of the subnets tasks are placed in.
    pub placement: SubnetTier,
    /// Deployment controller, fixed at construction.
    pub deployment_controller: DeploymentController,
}

/// Which traffic a listener/target-group pair carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ListenerRole {
    /// Production traffic.
    Production,
    /// Pre-shift validation traffic of a blue-green release.
    Test,
}

impl ListenerRole {
    /// Prefix used in logical IDs.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Production => "Prod",
            Self::Test => "Test",
        }
    }
}

/// Listener protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Protocol {
    /// Plain HTTP.
    Http,
    /// TLS-terminated HTTP.
    Https,
}

/// TLS negotiation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SslPolicy {
    /// The provider's recommended policy.
    Recommended,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerSpec {
    /// Traffic carried.
    pub role: ListenerRole,
    /// Listening port.
    pub port: u16,
    /// Protocol.
    pub protocol: Protocol,
    /// Bound certificate, if any.
    pub certificate_arn: Option<String>,
    /// TLS policy, set with a certificate.
    pub ssl_policy: Option<SslPolicy>,
}

/// Fixed response returned by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Content type header.
    pub content_type: String,
    /// Response body.
    pub message_body: String,
}

/// Listener rule settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerRuleSpec {
    /// Evaluation priority; lower runs first.
    pub priority: u32,
    /// Path patterns matched.
    pub path_patterns: Vec<String>,
    /// Response returned on match.
    pub action: FixedResponse,
}

/// Target-group health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHealthCheck {
    /// Whether checks run.
    pub enabled: bool,
    /// Seconds between checks.
    pub interval_seconds: u32,
    /// Health check path.
    pub path: String,
    /// Seconds before a check times out.
    pub timeout_seconds: u32,
    /// Successes before healthy.
    pub healthy_threshold: u32,
    /// Failures before unhealthy.
    pub unhealthy_threshold: u32,
    /// Status codes counted as healthy.
    pub healthy_http_codes: String,
}

/// Target group settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroupSpec {
    /// Traffic carried.
    pub role: ListenerRole,
    /// Port targets receive traffic on.
    pub port: u16,
    /// Health check.
    pub health_check: TargetHealthCheck,
    /// Seconds to drain deregistering targets.
    pub deregistration_delay_seconds: u32,
}

/// Kinds of resources a graph may import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportedKind {
    /// A network.
    Network,
    /// A subnet.
    Subnet,
    /// A load balancer.
    LoadBalancer,
    /// A service.
    Service,
}

/// Reference to a resource owned by another graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedSpec {
    /// What is referenced.
    pub kind: ImportedKind,
    /// Physical identifier or logical ID of the referenced resource.
    pub reference: String,
}
