//! # stackwright-pipeline
//!
//! Release pipeline composition and promotion for Stackwright.
//!
//! Handles:
//! - **Model**: Immutable pipeline definitions (wave, stages, gates, steps).
//! - **Compose**: Building a pipeline from global and per-environment config.
//! - **Fingerprint**: SHA-256 digest of a pipeline definition.
//! - **Gate**: The validation gate runner interface.
//! - **Synth**: Per-domain stack synthesis during promotion.
//! - **Runner**: Sequential, gated promotion with self-mutation.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod compose;
pub mod fingerprint;
pub mod gate;
pub mod model;
pub mod runner;
pub mod synth;

pub use compose::compose;
pub use gate::{GateOutcome, GateRunner};
pub use model::{PromotionPipeline, Stage, TestSelector, ValidationGate};
pub use runner::{PromotionReport, PromotionRunner};
pub use synth::{Synthesizer, TopologySynthesizer};
