//! Sequential, gated promotion.
//!
//! A run first compares the deployed pipeline fingerprint with the composed
//! one. On mismatch the pipeline mutates itself: every stage is
//! re-synthesized and any failure aborts the run before a single
//! environment is promoted. Stages then run strictly in order, gate before
//! synthesis; the first failing gate or synthesis error halts the run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::{EnvironmentName, RunId, Sha256Hash};

use crate::gate::GateRunner;
use crate::model::{PromotionPipeline, Stage};
use crate::synth::Synthesizer;

/// What happened to one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum StageStatus {
    /// Gates passed and the stack was synthesized.
    Promoted {
        /// Resources in the synthesized graph.
        resources: usize,
    },
    /// A gate rejected the stage.
    GateFailed {
        /// Failing gate.
        gate: String,
        /// Runner output.
        diagnostics: String,
    },
    /// Gates passed but the stack could not be synthesized.
    SynthesisFailed {
        /// Rendered synthesis error.
        error: String,
    },
    /// Not attempted because an earlier stage halted the run.
    Skipped,
}

/// Record of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    /// Stage name.
    pub stage: String,
    /// Environment promoted.
    pub environment: EnvironmentName,
    /// Outcome.
    #[serde(flatten)]
    pub status: StageStatus,
    /// When the outcome was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Record of one promotion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionReport {
    /// Unique run ID.
    pub run_id: RunId,
    /// Pipeline name.
    pub pipeline: String,
    /// Fingerprint of the definition that ran.
    pub fingerprint: Sha256Hash,
    /// Whether the run started with self-mutation.
    pub self_mutated: bool,
    /// Stage records, in promotion order.
    pub stages: Vec<StageRecord>,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// End time.
    pub finished_at: DateTime<Utc>,
}

impl PromotionReport {
    /// Environments promoted by the run, in order.
    #[must_use]
    pub fn promoted(&self) -> Vec<EnvironmentName> {
        self.stages
            .iter()
            .filter(|r| matches!(r.status, StageStatus::Promoted { .. }))
            .map(|r| r.environment)
            .collect()
    }

    /// Whether every stage was promoted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stages
            .iter()
            .all(|r| matches!(r.status, StageStatus::Promoted { .. }))
    }

    /// Returns the gate failure that halted the run, if any.
    #[must_use]
    pub fn gate_failure(&self) -> Option<StackwrightError> {
        self.stages.iter().find_map(|r| match &r.status {
            StageStatus::GateFailed { gate, diagnostics } => Some(StackwrightError::GateFailure {
                environment: r.environment,
                gate: gate.clone(),
                diagnostics: diagnostics.clone(),
            }),
            _ => None,
        })
    }

    /// Returns the synthesis error that halted the run, if any.
    #[must_use]
    pub fn synthesis_failure(&self) -> Option<StackwrightError> {
        self.stages.iter().find_map(|r| match &r.status {
            StageStatus::SynthesisFailed { error } => Some(StackwrightError::Synthesis {
                environment: r.environment,
                message: error.clone(),
            }),
            _ => None,
        })
    }

    /// Converts a halted run into the error that halted it.
    ///
    /// # Errors
    ///
    /// Returns [`StackwrightError::GateFailure`] if a gate halted the run,
    /// or [`StackwrightError::Synthesis`] if a stage failed to synthesize.
    pub fn into_result(self) -> Result<Self> {
        match self.gate_failure().or_else(|| self.synthesis_failure()) {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Drives a pipeline through its stages.
#[derive(Debug)]
pub struct PromotionRunner<G, S> {
    gates: G,
    synthesizer: S,
}

impl<G: GateRunner, S: Synthesizer> PromotionRunner<G, S> {
    /// Creates a runner.
    pub const fn new(gates: G, synthesizer: S) -> Self {
        Self { gates, synthesizer }
    }

    /// Consumes the runner, returning its parts.
    pub fn into_parts(self) -> (G, S) {
        (self.gates, self.synthesizer)
    }

    /// Runs `pipeline`.
    ///
    /// `deployed` is the fingerprint of the pipeline currently deployed;
    /// `None` means no pipeline has been deployed yet.
    ///
    /// A failing gate or a stage that fails to synthesize does not make
    /// this return an error: the report records it next to the stages
    /// already promoted, and [`PromotionReport::into_result`] surfaces it.
    ///
    /// # Errors
    ///
    /// Returns an error if self-mutation fails or a gate cannot be run.
    pub fn run(
        &mut self,
        pipeline: &PromotionPipeline,
        deployed: Option<&Sha256Hash>,
    ) -> Result<PromotionReport> {
        let started_at = Utc::now();
        let run_id = RunId::generate();
        let _span = tracing::info_span!("promote", pipeline = pipeline.name(), run = %run_id)
            .entered();

        let self_mutated = deployed != Some(pipeline.fingerprint());
        if self_mutated {
            self.self_mutate(pipeline, deployed)?;
        }

        let mut stages = Vec::with_capacity(pipeline.stages().len());
        let mut halted = false;
        for stage in pipeline.stages() {
            let environment = stage.environment_name();
            if halted {
                stages.push(StageRecord {
                    stage: stage.name.clone(),
                    environment,
                    status: StageStatus::Skipped,
                    recorded_at: Utc::now(),
                });
                continue;
            }

            let mut failure = None;
            for gate in &stage.gates {
                tracing::info!(stage = %stage.name, gate = %gate.name, "running validation gate");
                let outcome = self.gates.run_gate(environment, gate)?;
                if !outcome.passed {
                    tracing::warn!(
                        stage = %stage.name,
                        gate = %gate.name,
                        "validation gate failed, halting promotion"
                    );
                    failure = Some(StageStatus::GateFailed {
                        gate: gate.name.clone(),
                        diagnostics: outcome.diagnostics,
                    });
                    break;
                }
            }

            let status = match failure {
                Some(failure) => failure,
                None => self.synthesize_stage(pipeline, stage),
            };
            halted = !matches!(status, StageStatus::Promoted { .. });
            stages.push(StageRecord {
                stage: stage.name.clone(),
                environment,
                status,
                recorded_at: Utc::now(),
            });
        }

        Ok(PromotionReport {
            run_id,
            pipeline: pipeline.name().to_string(),
            fingerprint: pipeline.fingerprint().clone(),
            self_mutated,
            stages,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn synthesize_stage(&mut self, pipeline: &PromotionPipeline, stage: &Stage) -> StageStatus {
        match self
            .synthesizer
            .synthesize(pipeline.domain(), &stage.environment)
        {
            Ok(graph) => {
                tracing::info!(stage = %stage.name, resources = graph.len(), "stage promoted");
                StageStatus::Promoted {
                    resources: graph.len(),
                }
            }
            Err(e) => {
                tracing::error!(
                    stage = %stage.name,
                    error = %e,
                    "synthesis failed, halting promotion"
                );
                StageStatus::SynthesisFailed {
                    error: e.to_string(),
                }
            }
        }
    }

    fn self_mutate(
        &mut self,
        pipeline: &PromotionPipeline,
        deployed: Option<&Sha256Hash>,
    ) -> Result<()> {
        tracing::info!(
            deployed = %deployed.map_or_else(|| "none".to_string(), ToString::to_string),
            composed = %pipeline.fingerprint(),
            "pipeline definition changed, self-mutating"
        );
        for stage in pipeline.stages() {
            let _ = self
                .synthesizer
                .synthesize(pipeline.domain(), &stage.environment)?;
        }
        Ok(())
    }
}
