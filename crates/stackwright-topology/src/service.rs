//! Service Topology Builder.
//!
//! Produces the compute sub-graph: image repository, log group, cluster,
//! task definition, and the service itself. The network is referenced
//! through imported nodes, never owned.

use stackwright_common::constants::{CONTAINER_PORT, HOST_PORT, LOG_STREAM_PREFIX};
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::ResourceId;
use stackwright_config::{ComputeConfig, DeploymentStrategy};

use crate::graph::{TopologyBuilder, TopologyGraph};
use crate::network::NetworkTopology;
use crate::resource::{
    ContainerSpec, DeploymentController, ExternalController, ImportedKind, LogGroupSpec,
    PortMapping, Relation, RemovalPolicy, RepositorySpec, ResourceKind, ServiceSpec, SubnetTier,
    TaskDefinitionSpec,
};

/// Logical ID of the image repository.
pub const REPOSITORY_ID: &str = "Repository";
/// Logical ID of the container log group.
pub const LOG_GROUP_ID: &str = "EcsLogGroup";
/// Logical ID of the cluster.
pub const CLUSTER_ID: &str = "Cluster";
/// Logical ID of the task definition.
pub const TASK_DEFINITION_ID: &str = "TaskDef";
/// Logical ID of the service.
pub const SERVICE_ID: &str = "Service";

/// The compute sub-graph of one environment.
#[derive(Debug, Clone)]
pub struct ServiceTopology {
    graph: TopologyGraph,
    service: ResourceId,
    controller: DeploymentController,
    placement: SubnetTier,
}

impl ServiceTopology {
    /// The frozen resource graph.
    #[must_use]
    pub const fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    /// Consumes the topology, returning its graph.
    #[must_use]
    pub fn into_graph(self) -> TopologyGraph {
        self.graph
    }

    /// Logical ID of the service node.
    #[must_use]
    pub const fn service_id(&self) -> &ResourceId {
        &self.service
    }

    /// Controller the service was constructed with.
    #[must_use]
    pub const fn controller(&self) -> DeploymentController {
        self.controller
    }

    /// Tier the service's tasks are placed in.
    #[must_use]
    pub const fn placement(&self) -> SubnetTier {
        self.placement
    }
}

/// The controller a strategy requires.
#[must_use]
pub const fn controller_for(strategy: &DeploymentStrategy) -> DeploymentController {
    match *strategy {
        DeploymentStrategy::RollingUpdate {
            circuit_breaker_rollback,
        } => DeploymentController::Rolling {
            circuit_breaker_rollback,
        },
        DeploymentStrategy::BlueGreen => {
            DeploymentController::External(ExternalController::CodeDeploy)
        }
    }
}

/// Builds [`ServiceTopology`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceTopologyBuilder;

impl ServiceTopologyBuilder {
    /// Builds the compute sub-graph inside `network`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if tasks need private placement but the
    /// network has no application tier.
    pub fn build(
        compute: &ComputeConfig,
        strategy: &DeploymentStrategy,
        network: &NetworkTopology,
    ) -> Result<ServiceTopology> {
        let placement = if compute.service.assign_public_ip {
            SubnetTier::Ingress
        } else {
            SubnetTier::Application
        };
        if !network.has_tier(placement) {
            return Err(StackwrightError::config(
                "compute.service.assignPublicIp",
                format!(
                    "true, because the network has no {placement} subnets \
                     (network.addressing.natGatewayCount is 0)"
                ),
            ));
        }

        let mut builder = TopologyBuilder::new();
        let network_id = network.network_id();
        let vpc = builder.import(
            network_id.clone(),
            ImportedKind::Network,
            network.vpc_id().unwrap_or_else(|| network_id.as_str()),
        );
        let subnets: Vec<ResourceId> = network
            .subnets(placement)
            .iter()
            .map(|id| builder.import(id.clone(), ImportedKind::Subnet, id.as_str()))
            .collect();

        let repository = builder.add(
            REPOSITORY_ID,
            ResourceKind::Repository(RepositorySpec {
                removal_policy: RemovalPolicy::Destroy,
            }),
        )?;
        let log_group = builder.add(
            LOG_GROUP_ID,
            ResourceKind::LogGroup(LogGroupSpec {
                stream_prefix: LOG_STREAM_PREFIX.to_string(),
            }),
        )?;
        let cluster = builder.add(CLUSTER_ID, ResourceKind::Cluster)?;
        builder.link(&cluster, &vpc, Relation::AttachesTo)?;

        let task = builder.add(
            TASK_DEFINITION_ID,
            ResourceKind::TaskDefinition(TaskDefinitionSpec {
                family: compute.family_name.clone(),
                memory_mib: compute.memory_mib,
                cpu_units: compute.cpu_units,
                execution_role_arn: compute.execution_role_arn.clone(),
                task_role_policies: compute.task_role_policies.clone(),
                container: ContainerSpec {
                    name: compute.container.name.clone(),
                    environment: compute.container.environment_variables.clone(),
                    port_mappings: vec![PortMapping {
                        container_port: CONTAINER_PORT,
                        host_port: HOST_PORT,
                    }],
                },
            }),
        )?;
        builder.link(&task, &repository, Relation::PullsFrom)?;
        builder.link(&task, &log_group, Relation::LogsTo)?;

        let controller = controller_for(strategy);
        let service = builder.add(
            SERVICE_ID,
            ResourceKind::Service(ServiceSpec {
                desired_count: compute.service.desired_count,
                min_healthy_percent: compute.service.min_healthy_percent,
                max_healthy_percent: compute.service.max_healthy_percent,
                health_check_grace_period_seconds: 0,
                assign_public_ip: compute.service.assign_public_ip,
                placement,
                deployment_controller: controller,
            }),
        )?;
        builder.link(&service, &cluster, Relation::AttachesTo)?;
        builder.link(&service, &task, Relation::DependsOn)?;
        for subnet in &subnets {
            builder.link(&service, subnet, Relation::AttachesTo)?;
        }

        tracing::info!(
            family = %compute.family_name,
            strategy = strategy.name(),
            placement = %placement,
            subnets = subnets.len(),
            "service topology built"
        );

        Ok(ServiceTopology {
            graph: builder.finish(),
            service,
            controller,
            placement,
        })
    }
}
