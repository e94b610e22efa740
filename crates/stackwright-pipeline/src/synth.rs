//! Stack synthesis during promotion.

use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::ServiceDomain;
use stackwright_config::EnvironmentConfig;
use stackwright_topology::TopologyGraph;
use stackwright_topology::lookup::InMemoryDirectory;
use stackwright_topology::stack::{synthesize_network_stack, synthesize_service_stack};

/// Produces the resource graph of one stage.
pub trait Synthesizer {
    /// Synthesizes the stack of `domain` for `environment`.
    ///
    /// # Errors
    ///
    /// Returns configuration or lookup errors from the topology builders.
    fn synthesize(
        &mut self,
        domain: ServiceDomain,
        environment: &EnvironmentConfig,
    ) -> Result<TopologyGraph>;
}

/// Synthesizes stacks with the topology builders.
///
/// Network stages register their network and load balancer, so compute
/// stages promoted later in the same process can resolve them.
#[derive(Debug, Clone, Default)]
pub struct TopologySynthesizer {
    directory: InMemoryDirectory,
}

impl TopologySynthesizer {
    /// Creates a synthesizer with an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a synthesizer over an existing directory.
    #[must_use]
    pub const fn with_directory(directory: InMemoryDirectory) -> Self {
        Self { directory }
    }

    /// Synthesizes and registers the network of every environment.
    ///
    /// # Errors
    ///
    /// Returns the first network synthesis error.
    pub fn register_networks(&mut self, environments: &[EnvironmentConfig]) -> Result<()> {
        for environment in environments {
            let network = synthesize_network_stack(environment)?;
            self.directory.register_environment(environment, network);
        }
        Ok(())
    }

    /// The directory compute stages resolve against.
    #[must_use]
    pub const fn directory(&self) -> &InMemoryDirectory {
        &self.directory
    }
}

impl Synthesizer for TopologySynthesizer {
    fn synthesize(
        &mut self,
        domain: ServiceDomain,
        environment: &EnvironmentConfig,
    ) -> Result<TopologyGraph> {
        match domain {
            ServiceDomain::Network => {
                let network = synthesize_network_stack(environment)?;
                let graph = network.graph().clone();
                self.directory.register_environment(environment, network);
                Ok(graph)
            }
            ServiceDomain::Compute => synthesize_service_stack(environment, &self.directory),
            ServiceDomain::Api => Err(StackwrightError::config(
                "pipelines",
                "an enabled service domain (api is not supported yet)",
            )),
        }
    }
}
