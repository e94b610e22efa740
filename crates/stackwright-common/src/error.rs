//! Unified error types for the Stackwright workspace.
//!
//! Every fatal configuration error names the offending field path and the
//! constraint it violated, so a config can be corrected without inspecting
//! any generated topology.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::EnvironmentName;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum StackwrightError {
    /// A configuration value is missing or violates a constraint.
    #[error("invalid configuration at `{field}`: expected {constraint}")]
    Config {
        /// Dotted path of the offending field.
        field: String,
        /// The constraint the value must satisfy.
        constraint: String,
    },

    /// An external network or account lookup failed.
    #[error("{kind} lookup failed: {id}")]
    Lookup {
        /// Type of the resource being looked up.
        kind: &'static str,
        /// Identifier that could not be resolved.
        id: String,
    },

    /// A validation gate rejected promotion to an environment.
    #[error("validation gate `{gate}` failed for {environment}: {diagnostics}")]
    GateFailure {
        /// Environment whose promotion was halted.
        environment: EnvironmentName,
        /// Name of the failing gate.
        gate: String,
        /// Diagnostics reported by the gate runner.
        diagnostics: String,
    },

    /// A stage's stack could not be synthesized during promotion.
    #[error("synthesis failed for {environment}: {message}")]
    Synthesis {
        /// Environment whose stack failed to synthesize.
        environment: EnvironmentName,
        /// Rendered cause.
        message: String,
    },

    /// The resource graph is structurally invalid.
    #[error("invalid topology graph: {message}")]
    Graph {
        /// Description of the structural problem.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration document could not be parsed.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Path of the document.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl StackwrightError {
    /// Builds a [`StackwrightError::Config`] from a field path and constraint.
    pub fn config(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            constraint: constraint.into(),
        }
    }

    /// Returns `true` for configuration errors.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, StackwrightError>;
