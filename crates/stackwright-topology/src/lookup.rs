//! Network resolution against an account directory.
//!
//! The service stack never owns its network; it looks one up. A
//! [`NetworkResolver`] is chosen from the environment's
//! [`NetworkSelector`] and asks a [`NetworkDirectory`] for the topology.

use std::collections::BTreeMap;

use stackwright_common::error::{Result, StackwrightError};
use stackwright_config::{EnvironmentConfig, NetworkSelector};

use crate::network::{LoadBalancerRef, NetworkTopology};

/// Query for one network in an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkQuery {
    /// Physical network ID, if a specific network is wanted.
    pub vpc_id: Option<String>,
    /// Whether the account's default network is wanted.
    pub is_default: bool,
}

impl NetworkQuery {
    /// Query for a network by ID.
    #[must_use]
    pub fn by_id(vpc_id: impl Into<String>) -> Self {
        Self {
            vpc_id: Some(vpc_id.into()),
            is_default: false,
        }
    }

    /// Query for the default network.
    #[must_use]
    pub const fn default_network() -> Self {
        Self {
            vpc_id: None,
            is_default: true,
        }
    }

    fn describe(&self) -> String {
        self.vpc_id
            .clone()
            .unwrap_or_else(|| "default network".to_string())
    }
}

/// Looks up existing networks and load balancers in an account.
pub trait NetworkDirectory {
    /// Finds the network matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if no network matches.
    fn find_network(&self, query: &NetworkQuery) -> Result<NetworkTopology>;

    /// Finds a load balancer by ARN.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the ARN is unknown.
    fn find_load_balancer(&self, arn: &str) -> Result<LoadBalancerRef>;
}

/// Strategy for locating the network a service is placed into.
pub trait NetworkResolver {
    /// Resolves the network through `directory`.
    ///
    /// # Errors
    ///
    /// Propagates the directory's lookup error unchanged.
    fn resolve(&self, directory: &dyn NetworkDirectory) -> Result<NetworkTopology>;
}

/// Resolves a network by its physical ID.
#[derive(Debug, Clone)]
pub struct ByIdResolver {
    vpc_id: String,
}

impl ByIdResolver {
    /// Creates a resolver for `vpc_id`.
    #[must_use]
    pub fn new(vpc_id: impl Into<String>) -> Self {
        Self {
            vpc_id: vpc_id.into(),
        }
    }
}

impl NetworkResolver for ByIdResolver {
    fn resolve(&self, directory: &dyn NetworkDirectory) -> Result<NetworkTopology> {
        tracing::debug!(vpc_id = %self.vpc_id, "resolving network by id");
        directory.find_network(&NetworkQuery::by_id(&self.vpc_id))
    }
}

/// Resolves the account's default network.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNetworkResolver;

impl NetworkResolver for DefaultNetworkResolver {
    fn resolve(&self, directory: &dyn NetworkDirectory) -> Result<NetworkTopology> {
        tracing::debug!("resolving default network");
        directory.find_network(&NetworkQuery::default_network())
    }
}

/// Picks the resolver for a selector.
#[must_use]
pub fn resolver_for(selector: &NetworkSelector) -> Box<dyn NetworkResolver> {
    match selector {
        NetworkSelector::ById(vpc_id) => Box::new(ByIdResolver::new(vpc_id)),
        NetworkSelector::Default => Box::new(DefaultNetworkResolver),
    }
}

/// A directory backed by locally synthesized network topologies.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    networks: BTreeMap<String, NetworkTopology>,
    default_network: Option<NetworkTopology>,
    load_balancers: BTreeMap<String, LoadBalancerRef>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a network under the selector that later lookups will use.
    ///
    /// Registering the same ID again replaces the earlier topology.
    pub fn register_network(&mut self, selector: &NetworkSelector, network: NetworkTopology) {
        match selector {
            NetworkSelector::ById(vpc_id) => {
                let network = network.identified_as(vpc_id.clone());
                let _ = self.networks.insert(vpc_id.clone(), network);
            }
            NetworkSelector::Default => self.default_network = Some(network),
        }
    }

    /// Registers a load balancer under its ARN.
    pub fn register_load_balancer(&mut self, arn: &str, load_balancer: LoadBalancerRef) {
        let _ = self
            .load_balancers
            .insert(arn.to_string(), load_balancer.with_arn(arn));
    }

    /// Registers an environment's network and its load balancer.
    pub fn register_environment(&mut self, config: &EnvironmentConfig, network: NetworkTopology) {
        let load_balancer = network.load_balancer().clone();
        self.register_network(&config.network_ref.network, network);
        self.register_load_balancer(&config.network_ref.load_balancer.arn, load_balancer);
        tracing::debug!(
            environment = %config.name,
            arn = %config.network_ref.load_balancer.arn,
            "registered network"
        );
    }

    /// Number of registered networks, including the default one.
    #[must_use]
    pub fn network_count(&self) -> usize {
        self.networks.len() + usize::from(self.default_network.is_some())
    }
}

impl NetworkDirectory for InMemoryDirectory {
    fn find_network(&self, query: &NetworkQuery) -> Result<NetworkTopology> {
        let found = match &query.vpc_id {
            Some(vpc_id) => self.networks.get(vpc_id),
            None if query.is_default => self.default_network.as_ref(),
            None => None,
        };
        found.cloned().ok_or_else(|| StackwrightError::Lookup {
            kind: "network",
            id: query.describe(),
        })
    }

    fn find_load_balancer(&self, arn: &str) -> Result<LoadBalancerRef> {
        self.load_balancers
            .get(arn)
            .cloned()
            .ok_or_else(|| StackwrightError::Lookup {
                kind: "load balancer",
                id: arn.to_string(),
            })
    }
}
