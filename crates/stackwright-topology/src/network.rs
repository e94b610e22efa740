//! Network Topology Builder.
//!
//! Produces the network sub-graph of one environment: the VPC, its subnet
//! tiers, internet and NAT gateways, optional dual-stack addressing, and the
//! shared internet-facing load balancer.

use std::collections::BTreeMap;

use stackwright_common::constants::{NETWORK_CIDR, SUBNET_IPV6_PREFIX};
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::ResourceId;
use stackwright_config::NetworkConfig;

use crate::cidr::CidrAllocator;
use crate::graph::{TopologyBuilder, TopologyGraph};
use crate::resource::{
    IpAddressType, Ipv6BlockSpec, LoadBalancerSpec, NatGatewaySpec, NetworkSpec, Relation,
    ResourceKind, SubnetIpv6Spec, SubnetSpec, SubnetTier,
};

/// Logical ID of the network.
pub const NETWORK_ID: &str = "Vpc";
/// Logical ID of the internet gateway.
pub const INTERNET_GATEWAY_ID: &str = "VpcInternetGateway";
/// Logical ID of the network IPv6 block.
pub const IPV6_BLOCK_ID: &str = "Ipv6Cidr";
/// Logical ID of the shared load balancer.
pub const LOAD_BALANCER_ID: &str = "Alb";

/// Read-only handle to a load balancer, shared with traffic resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerRef {
    /// Logical ID in the graph that owns the load balancer.
    pub id: ResourceId,
    /// Physical ARN, once the load balancer has been registered.
    pub arn: Option<String>,
    /// Whether the load balancer has public addresses.
    pub internet_facing: bool,
    /// Whether it listens on IPv4 and IPv6.
    pub dual_stack: bool,
}

impl LoadBalancerRef {
    /// Returns a copy carrying the physical ARN.
    #[must_use]
    pub fn with_arn(mut self, arn: impl Into<String>) -> Self {
        self.arn = Some(arn.into());
        self
    }

    /// ARN if known, otherwise the logical ID.
    #[must_use]
    pub fn reference(&self) -> &str {
        self.arn.as_deref().unwrap_or_else(|| self.id.as_str())
    }
}

/// The network sub-graph of one environment.
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    graph: TopologyGraph,
    vpc_id: Option<String>,
    load_balancer: LoadBalancerRef,
    subnets: BTreeMap<SubnetTier, Vec<ResourceId>>,
}

impl NetworkTopology {
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

    /// Logical ID of the network node.
    #[must_use]
    pub fn network_id(&self) -> ResourceId {
        ResourceId::new(NETWORK_ID)
    }

    /// Physical network ID, once the topology is registered under one.
    #[must_use]
    pub fn vpc_id(&self) -> Option<&str> {
        self.vpc_id.as_deref()
    }

    /// Returns the topology tagged with a physical network ID.
    #[must_use]
    pub fn identified_as(mut self, vpc_id: impl Into<String>) -> Self {
        self.vpc_id = Some(vpc_id.into());
        self
    }

    /// The shared load balancer.
    #[must_use]
    pub const fn load_balancer(&self) -> &LoadBalancerRef {
        &self.load_balancer
    }

    /// Subnets of `tier`, ordered by zone. Empty if the tier is absent.
    #[must_use]
    pub fn subnets(&self, tier: SubnetTier) -> &[ResourceId] {
        self.subnets.get(&tier).map_or(&[], Vec::as_slice)
    }

    /// Whether the tier has any subnets.
    #[must_use]
    pub fn has_tier(&self, tier: SubnetTier) -> bool {
        !self.subnets(tier).is_empty()
    }

    /// Tiers present, in plan order.
    pub fn tiers(&self) -> impl Iterator<Item = SubnetTier> + '_ {
        self.subnets.keys().copied()
    }
}

/// Builds [`NetworkTopology`] values from addressing settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkTopologyBuilder;

impl NetworkTopologyBuilder {
    /// Subnet tiers for a config, in allocation order.
    #[must_use]
    pub fn tiers(config: &NetworkConfig) -> Vec<SubnetTier> {
        let mut tiers = vec![SubnetTier::Ingress, SubnetTier::Data];
        if config.has_application_tier() {
            tiers.push(SubnetTier::Application);
        }
        tiers
    }

    /// Builds the network sub-graph.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `maxAvailabilityZones` is zero or the
    /// subnet plan does not fit in the network block.
    pub fn build(config: &NetworkConfig) -> Result<NetworkTopology> {
        let zones = config.max_availability_zones;
        if zones < 1 {
            return Err(StackwrightError::config(
                "network.addressing.maxAvailabilityZones",
                "at least 1",
            ));
        }

        let nat_gateways = config.nat_gateway_count.min(zones);
        if config.nat_gateway_count > zones {
            tracing::warn!(
                requested = config.nat_gateway_count,
                zones,
                "more NAT gateways than availability zones, clamping"
            );
        }

        let mut builder = TopologyBuilder::new();
        let mut cidrs = CidrAllocator::new(NETWORK_CIDR)?;
        let vpc = builder.add(
            NETWORK_ID,
            ResourceKind::Network(NetworkSpec {
                cidr: cidrs.parent(),
                max_availability_zones: zones,
                nat_gateways,
                dual_stack: config.ipv6_enabled,
            }),
        )?;

        let mut subnets: BTreeMap<SubnetTier, Vec<ResourceId>> = BTreeMap::new();
        for tier in Self::tiers(config) {
            let ids = subnets.entry(tier).or_default();
            for zone in 0..zones {
                let id = builder.add(
                    tier.subnet_id(zone),
                    ResourceKind::Subnet(SubnetSpec {
                        tier,
                        zone,
                        cidr: cidrs.allocate(tier.cidr_mask())?,
                        map_public_ip: tier.is_public(),
                    }),
                )?;
                builder.link(&id, &vpc, Relation::AttachesTo)?;
                ids.push(id);
            }
        }

        let public = subnets
            .get(&SubnetTier::Ingress)
            .cloned()
            .unwrap_or_default();

        let igw = builder.add(INTERNET_GATEWAY_ID, ResourceKind::InternetGateway)?;
        builder.link(&igw, &vpc, Relation::AttachesTo)?;
        for subnet in &public {
            builder.link(subnet, &igw, Relation::RoutesTo)?;
        }

        let mut nats = Vec::new();
        for (zone, subnet) in (0..nat_gateways).zip(&public) {
            let nat = builder.add(
                format!("{subnet}NatGateway"),
                ResourceKind::NatGateway(NatGatewaySpec { zone }),
            )?;
            builder.link(&nat, subnet, Relation::AttachesTo)?;
            builder.link(&nat, &igw, Relation::DependsOn)?;
            nats.push(nat);
        }
        if !nats.is_empty() {
            for (i, subnet) in subnets
                .get(&SubnetTier::Application)
                .into_iter()
                .flatten()
                .enumerate()
            {
                builder.link(subnet, &nats[i % nats.len()], Relation::RoutesTo)?;
            }
        }

        let assignments = if config.ipv6_enabled {
            enable_ipv6(&mut builder, &vpc, &public)?
        } else {
            Vec::new()
        };

        let alb = builder.add(
            LOAD_BALANCER_ID,
            ResourceKind::LoadBalancer(LoadBalancerSpec {
                internet_facing: true,
                ip_address_type: IpAddressType::DualStack,
            }),
        )?;
        for subnet in &public {
            builder.link(&alb, subnet, Relation::AttachesTo)?;
        }
        for assignment in &assignments {
            builder.link(&alb, assignment, Relation::DependsOn)?;
        }

        tracing::info!(
            zones,
            nat_gateways,
            ipv6 = config.ipv6_enabled,
            tiers = subnets.len(),
            "network topology built"
        );

        Ok(NetworkTopology {
            graph: builder.finish(),
            vpc_id: None,
            load_balancer: LoadBalancerRef {
                id: alb,
                arn: None,
                internet_facing: true,
                dual_stack: true,
            },
            subnets,
        })
    }
}

/// Adds the provider-assigned block and one /64 per public subnet.
fn enable_ipv6(
    builder: &mut TopologyBuilder,
    vpc: &ResourceId,
    public: &[ResourceId],
) -> Result<Vec<ResourceId>> {
    let block = builder.add(
        IPV6_BLOCK_ID,
        ResourceKind::Ipv6Block(Ipv6BlockSpec {
            provider_assigned: true,
        }),
    )?;
    builder.link(&block, vpc, Relation::DependsOn)?;

    let mut assignments = Vec::with_capacity(public.len());
    for (index, subnet) in public.iter().enumerate() {
        let id = builder.add(
            format!("{subnet}Ipv6Cidr"),
            ResourceKind::SubnetIpv6Assignment(SubnetIpv6Spec {
                subnet: subnet.clone(),
                selection_index: index,
                partitions: public.len(),
                prefix_length: SUBNET_IPV6_PREFIX,
            }),
        )?;
        builder.link(&id, &block, Relation::DependsOn)?;
        builder.link(&id, subnet, Relation::AttachesTo)?;
        assignments.push(id);
    }
    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(zones: u32, nats: u32, ipv6: bool) -> NetworkConfig {
        NetworkConfig {
            max_availability_zones: zones,
            nat_gateway_count: nats,
            ipv6_enabled: ipv6,
        }
    }

    fn subnet_count(topology: &NetworkTopology, tier: SubnetTier) -> usize {
        topology
            .graph()
            .specs(ResourceKind::as_subnet)
            .iter()
            .filter(|(_, s)| s.tier == tier)
            .count()
    }

    #[test]
    fn no_nat_two_zones_ipv4_only() {
        let topology = NetworkTopologyBuilder::build(&config(2, 0, false)).unwrap();
        let graph = topology.graph();
        assert_eq!(graph.count("Subnet"), 4);
        assert_eq!(subnet_count(&topology, SubnetTier::Application), 0);
        assert_eq!(graph.count("LoadBalancer"), 1);
        assert_eq!(graph.count("NatGateway"), 0);
        assert_eq!(graph.count("Ipv6Block"), 0);
        assert!(!topology.has_tier(SubnetTier::Application));
    }

    #[test]
    fn nat_gateways_add_application_tier() {
        let topology = NetworkTopologyBuilder::build(&config(3, 1, false)).unwrap();
        assert_eq!(subnet_count(&topology, SubnetTier::Application), 3);
        assert_eq!(topology.graph().count("NatGateway"), 1);

        let nat = ResourceId::new("VpcIngressSubnet1NatGateway");
        for subnet in topology.subnets(SubnetTier::Application) {
            assert!(topology.graph().has_edge(subnet, &nat, Relation::RoutesTo));
        }
    }

    #[test]
    fn nat_count_is_clamped_to_zones() {
        let topology = NetworkTopologyBuilder::build(&config(2, 5, false)).unwrap();
        assert_eq!(topology.graph().count("NatGateway"), 2);
    }

    #[test]
    fn application_subnets_spread_over_nat_gateways() {
        let topology = NetworkTopologyBuilder::build(&config(3, 2, false)).unwrap();
        let graph = topology.graph();
        let app = topology.subnets(SubnetTier::Application);
        let first = ResourceId::new("VpcIngressSubnet1NatGateway");
        let second = ResourceId::new("VpcIngressSubnet2NatGateway");
        assert!(graph.has_edge(&app[0], &first, Relation::RoutesTo));
        assert!(graph.has_edge(&app[1], &second, Relation::RoutesTo));
        assert!(graph.has_edge(&app[2], &first, Relation::RoutesTo));
    }

    #[test]
    fn zero_zones_is_config_error() {
        let err = NetworkTopologyBuilder::build(&config(0, 0, false)).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("maxAvailabilityZones"));
    }

    #[test]
    fn cidr_plan_is_tier_then_zone() {
        let topology = NetworkTopologyBuilder::build(&config(2, 1, false)).unwrap();
        let cidrs: Vec<(String, String)> = topology
            .graph()
            .specs(ResourceKind::as_subnet)
            .into_iter()
            .map(|(id, s)| (id.to_string(), s.cidr.to_string()))
            .collect();
        assert_eq!(
            cidrs,
            vec![
                ("VpcIngressSubnet1".into(), "10.0.0.0/24".into()),
                ("VpcIngressSubnet2".into(), "10.0.1.0/24".into()),
                ("VpcDataSubnet1".into(), "10.0.2.0/28".into()),
                ("VpcDataSubnet2".into(), "10.0.2.16/28".into()),
                ("VpcApplicationSubnet1".into(), "10.0.3.0/24".into()),
                ("VpcApplicationSubnet2".into(), "10.0.4.0/24".into()),
            ]
        );
    }

    #[test]
    fn ipv6_assigns_one_block_per_public_subnet() {
        let topology = NetworkTopologyBuilder::build(&config(3, 0, true)).unwrap();
        let graph = topology.graph();
        let block = ResourceId::new(IPV6_BLOCK_ID);
        assert!(graph.has_edge(&block, &topology.network_id(), Relation::DependsOn));

        let assignments = graph.specs(ResourceKind::as_ipv6_assignment);
        assert_eq!(assignments.len(), 3);
        for (i, (id, spec)) in assignments.iter().enumerate() {
            assert_eq!(spec.selection_index, i);
            assert_eq!(spec.partitions, 3);
            assert_eq!(spec.prefix_length, 64);
            assert!(graph.has_edge(id, &block, Relation::DependsOn));
            assert!(graph.has_edge(id, &spec.subnet, Relation::AttachesTo));
            assert!(spec.subnet.as_str().starts_with("VpcIngress"));
        }
    }

    #[test]
    fn load_balancer_spans_public_subnets() {
        let topology = NetworkTopologyBuilder::build(&config(2, 0, false)).unwrap();
        let graph = topology.graph();
        let lb = topology.load_balancer();
        assert!(lb.internet_facing);
        assert!(lb.dual_stack);
        assert_eq!(graph.targets(&lb.id, Relation::AttachesTo).len(), 2);
        for subnet in topology.subnets(SubnetTier::Ingress) {
            assert!(graph.has_edge(&lb.id, subnet, Relation::AttachesTo));
        }
        let (_, spec) = graph.specs(ResourceKind::as_load_balancer)[0];
        assert_eq!(spec.ip_address_type, IpAddressType::DualStack);
    }

    #[test]
    fn graph_is_acyclic() {
        let topology = NetworkTopologyBuilder::build(&config(3, 2, true)).unwrap();
        let order = topology.graph().creation_order().unwrap();
        assert_eq!(order.first().map(ResourceId::as_str), Some(NETWORK_ID));
    }

    #[test]
    fn identified_topology_keeps_graph() {
        let topology = NetworkTopologyBuilder::build(&config(1, 0, false))
            .unwrap()
            .identified_as("vpc-123");
        assert_eq!(topology.vpc_id(), Some("vpc-123"));
        assert_eq!(topology.graph().count("Network"), 1);
    }
}
