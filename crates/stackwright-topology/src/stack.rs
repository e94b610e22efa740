//! Per-environment stack synthesis.
//!
//! A network stack is synthesized straight from the environment's
//! addressing settings. A service stack resolves its network and load
//! balancer through a [`NetworkDirectory`], then composes the service and
//! traffic sub-graphs into one graph.

use stackwright_common::error::Result;
use stackwright_config::{EnvironmentConfig, NetworkSelector};

use crate::graph::TopologyGraph;
use crate::lookup::{self, NetworkDirectory};
use crate::network::{NetworkTopology, NetworkTopologyBuilder};
use crate::service::ServiceTopologyBuilder;
use crate::strategy;

/// Synthesizes the network stack of one environment.
///
/// # Errors
///
/// Returns a configuration error for invalid addressing settings.
pub fn synthesize_network_stack(config: &EnvironmentConfig) -> Result<NetworkTopology> {
    let _span = tracing::info_span!("network_stack", environment = %config.name).entered();
    let network = NetworkTopologyBuilder::build(&config.network)?;
    Ok(match &config.network_ref.network {
        NetworkSelector::ById(vpc_id) => network.identified_as(vpc_id.clone()),
        NetworkSelector::Default => network,
    })
}

/// Synthesizes the service stack of one environment.
///
/// # Errors
///
/// Returns a lookup error if the network or load balancer cannot be found,
/// or a configuration error if the service cannot be placed.
pub fn synthesize_service_stack(
    config: &EnvironmentConfig,
    directory: &dyn NetworkDirectory,
) -> Result<TopologyGraph> {
    let _span = tracing::info_span!("service_stack", environment = %config.name).entered();

    let resolver = lookup::resolver_for(&config.network_ref.network);
    let network = resolver.resolve(directory)?;
    let load_balancer = directory.find_load_balancer(&config.network_ref.load_balancer.arn)?;

    let service = ServiceTopologyBuilder::build(&config.compute, &config.deployment, &network)?;
    let traffic = strategy::resolve(
        &config.deployment,
        &service,
        &load_balancer,
        &config.network_ref.load_balancer,
    )?;

    let graph = TopologyGraph::compose([service.into_graph(), traffic.into_graph()])?;
    tracing::info!(resources = graph.len(), "service stack synthesized");
    Ok(graph)
}
