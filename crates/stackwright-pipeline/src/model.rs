//! Pipeline definitions.
//!
//! A [`PromotionPipeline`] is produced once by [`crate::compose`] and then
//! only read: the runner consumes its stages in order and the CLI renders it.

use std::fmt;

use serde::Serialize;
use stackwright_common::types::{EnvironmentName, ServiceDomain, Sha256Hash};
use stackwright_config::EnvironmentConfig;

/// Name of the structural test a gate runs, `{domain}_{environment}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TestSelector(String);

impl TestSelector {
    /// Builds the selector of one domain and environment.
    #[must_use]
    pub fn new(domain: ServiceDomain, environment: EnvironmentName) -> Self {
        Self(format!("{domain}_{environment}"))
    }

    /// Returns the selector string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pre-promotion check of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationGate {
    /// Display name.
    pub name: String,
    /// Structural test to run.
    pub selector: TestSelector,
    /// Shell commands, run in order.
    pub commands: Vec<String>,
}

/// One environment of a wave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Stage name (`Dev`, `Staging`, `Production`).
    pub name: String,
    /// Target account.
    pub account: String,
    /// Target region.
    pub region: String,
    /// Settings synthesized for this stage.
    pub environment: EnvironmentConfig,
    /// Gates that must pass before promotion.
    pub gates: Vec<ValidationGate>,
}

impl Stage {
    /// Environment promoted by this stage.
    #[must_use]
    pub const fn environment_name(&self) -> EnvironmentName {
        self.environment.name
    }
}

/// Ordered stages of one service domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wave {
    /// Wave name (`Network`, `Compute`).
    pub name: String,
    /// Stages in promotion order.
    pub stages: Vec<Stage>,
}

/// Where the pipeline's source comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    /// `owner/name` of the repository.
    pub repository: String,
    /// Tracked branch.
    pub branch: String,
    /// Connection used to reach the repository.
    pub connection_arn: String,
}

/// The build step that synthesizes every stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthStep {
    /// Shell commands, run in order.
    pub commands: Vec<String>,
}

/// The step that updates the pipeline from its own source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfMutationStep {
    /// Commands run before the build phase.
    pub pre_build: Vec<String>,
    /// Build commands; identical to the synth step's.
    pub commands: Vec<String>,
}

/// Definition fields covered by the fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDefinition {
    /// Pipeline name (`NetworkPipeline`, `ComputePipeline`).
    pub name: String,
    /// Domain promoted.
    pub domain: ServiceDomain,
    /// Source.
    pub source: SourceReference,
    /// Synth step.
    pub synth: SynthStep,
    /// Self-mutation step.
    pub self_mutation: SelfMutationStep,
    /// The single wave.
    pub wave: Wave,
}

/// A composed, immutable release pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionPipeline {
    #[serde(flatten)]
    definition: PipelineDefinition,
    fingerprint: Sha256Hash,
}

impl PromotionPipeline {
    pub(crate) const fn new(definition: PipelineDefinition, fingerprint: Sha256Hash) -> Self {
        Self {
            definition,
            fingerprint,
        }
    }

    /// Pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Domain promoted.
    #[must_use]
    pub const fn domain(&self) -> ServiceDomain {
        self.definition.domain
    }

    /// Source reference.
    #[must_use]
    pub const fn source(&self) -> &SourceReference {
        &self.definition.source
    }

    /// Synth step.
    #[must_use]
    pub const fn synth(&self) -> &SynthStep {
        &self.definition.synth
    }

    /// Self-mutation step.
    #[must_use]
    pub const fn self_mutation(&self) -> &SelfMutationStep {
        &self.definition.self_mutation
    }

    /// The wave.
    #[must_use]
    pub const fn wave(&self) -> &Wave {
        &self.definition.wave
    }

    /// Stages in promotion order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.definition.wave.stages
    }

    /// Digest of the definition.
    #[must_use]
    pub const fn fingerprint(&self) -> &Sha256Hash {
        &self.fingerprint
    }
}
