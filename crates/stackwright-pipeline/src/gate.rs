//! Validation gate interface.

use serde::Serialize;
use stackwright_common::error::Result;
use stackwright_common::types::EnvironmentName;

use crate::model::ValidationGate;

/// Result of running one gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateOutcome {
    /// Whether promotion may proceed.
    pub passed: bool,
    /// Runner output, kept for the report.
    pub diagnostics: String,
}

impl GateOutcome {
    /// A passing outcome.
    pub fn pass(diagnostics: impl Into<String>) -> Self {
        Self {
            passed: true,
            diagnostics: diagnostics.into(),
        }
    }

    /// A failing outcome.
    pub fn fail(diagnostics: impl Into<String>) -> Self {
        Self {
            passed: false,
            diagnostics: diagnostics.into(),
        }
    }
}

/// Executes validation gates.
///
/// Implementations run the environment's isolated structural test named by
/// the gate's selector. A runner that shells out executes the gate's own
/// `commands`, so what runs is what the pipeline fingerprint covers.
pub trait GateRunner {
    /// Runs `gate` for `environment`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the gate could not be run at all; a test
    /// failure is a non-passing [`GateOutcome`].
    fn run_gate(
        &mut self,
        environment: EnvironmentName,
        gate: &ValidationGate,
    ) -> Result<GateOutcome>;
}
