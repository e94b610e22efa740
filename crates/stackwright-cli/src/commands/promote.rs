//! `swt promote`: Promote a service domain through its pipeline.

use std::path::PathBuf;

use clap::Args;
use stackwright_common::types::{EnvironmentName, ServiceDomain, Sha256Hash};
use stackwright_config::loader::ConfigLoader;
use stackwright_pipeline::{PromotionReport, PromotionRunner, TopologySynthesizer};

use crate::commands::plan::load_pipeline;
use crate::gate::ShellGateRunner;
use crate::output;

/// Arguments for the `promote` command.
#[derive(Args, Debug)]
pub struct PromoteArgs {
    /// Service domain to promote.
    #[arg(long)]
    pub domain: ServiceDomain,

    /// Fingerprint of the currently deployed pipeline. Omit on first deploy.
    #[arg(long)]
    pub deployed_fingerprint: Option<Sha256Hash>,

    /// Directory the gate commands run from.
    #[arg(long, default_value = ".")]
    pub workdir: PathBuf,

    /// Print the promotion report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `promote` command.
///
/// Runs the shell commands of every stage's validation gate, as composed
/// into the pipeline, then synthesizes the stage. Compute promotions resolve against the networks of all
/// configured environments.
///
/// # Errors
///
/// Returns an error if loading or self-mutation fails, or if a validation
/// gate or a stage's synthesis halts the promotion.
pub fn execute(loader: &ConfigLoader, args: PromoteArgs) -> anyhow::Result<()> {
    let pipeline = load_pipeline(loader, args.domain)?;

    let gates = ShellGateRunner::new(args.workdir);
    let synthesizer = synthesizer_for(loader, args.domain)?;
    let mut runner = PromotionRunner::new(gates, synthesizer);
    let report = runner.run(&pipeline, args.deployed_fingerprint.as_ref())?;

    print_report(&report, args.json)?;
    let _ = report.into_result()?;
    Ok(())
}

fn synthesizer_for(
    loader: &ConfigLoader,
    domain: ServiceDomain,
) -> anyhow::Result<TopologySynthesizer> {
    let mut synthesizer = TopologySynthesizer::new();
    if domain == ServiceDomain::Compute {
        synthesizer.register_networks(&loader.load_environments(&EnvironmentName::ALL)?)?;
    }
    Ok(synthesizer)
}

fn print_report(report: &PromotionReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", output::render_report(report));
    }
    Ok(())
}
