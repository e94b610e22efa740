//! Formatted output helpers for CLI commands.
//!
//! Renders pipelines and promotion reports as plain text for terminals.
//! Machine-readable output goes through `serde_json` directly.

use std::fmt::Write;

use stackwright_pipeline::PromotionPipeline;
use stackwright_pipeline::runner::{PromotionReport, StageStatus};

const RULE: &str = "\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}\u{2550}";

/// Renders the stages and gates of a pipeline.
#[must_use]
pub fn render_plan(pipeline: &PromotionPipeline) -> String {
    let mut out = String::new();
    let source = pipeline.source();
    let _ = writeln!(out, "Pipeline: {}", pipeline.name());
    let _ = writeln!(out, "Source:   {}@{}", source.repository, source.branch);
    let _ = writeln!(out, "Version:  {}", pipeline.fingerprint());
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out);
    let _ = writeln!(out, "  Wave {}", pipeline.wave().name);

    for (position, stage) in pipeline.stages().iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {:<12} account {}  region {}",
            position + 1,
            stage.name,
            stage.account,
            stage.region
        );
        for gate in &stage.gates {
            let _ = writeln!(out, "       gate: {}", gate.name);
            for command in &gate.commands {
                let _ = writeln!(out, "         $ {command}");
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  {} stage(s) will be promoted in order.", pipeline.stages().len());
    out
}

/// Renders a one-line-per-stage summary of a promotion run.
#[must_use]
pub fn render_report(report: &PromotionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Run {} of {}", report.run_id, report.pipeline);
    if report.self_mutated {
        let _ = writeln!(out, "  pipeline updated to {}", report.fingerprint);
    }
    for record in &report.stages {
        let status = match &record.status {
            StageStatus::Promoted { resources } => format!("promoted ({resources} resources)"),
            StageStatus::GateFailed { gate, .. } => format!("halted by \"{gate}\""),
            StageStatus::SynthesisFailed { .. } => "synthesis failed".to_string(),
            StageStatus::Skipped => "skipped".to_string(),
        };
        let _ = writeln!(out, "  {:<12} {status}", record.stage);
    }
    out
}
