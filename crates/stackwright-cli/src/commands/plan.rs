//! `swt plan`: Display the release pipeline of a service domain.

use clap::Args;
use stackwright_common::types::ServiceDomain;
use stackwright_config::loader::ConfigLoader;
use stackwright_pipeline::PromotionPipeline;
use stackwright_pipeline::compose::compose_configured;

use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Service domain whose pipeline to compose.
    #[arg(long)]
    pub domain: ServiceDomain,

    /// Print the full pipeline definition as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `plan` command.
///
/// Loads the global settings and the environments of the domain's
/// promotion order, composes the pipeline, and displays it.
///
/// # Errors
///
/// Returns an error if loading or composition fails.
pub fn execute(loader: &ConfigLoader, args: PlanArgs) -> anyhow::Result<()> {
    let pipeline = load_pipeline(loader, args.domain)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&pipeline)?);
    } else {
        print!("{}", output::render_plan(&pipeline));
    }
    Ok(())
}

/// Composes the pipeline of `domain` from the config directory.
///
/// # Errors
///
/// Returns an error if a document cannot be loaded or the pipeline cannot
/// be composed.
pub fn load_pipeline(
    loader: &ConfigLoader,
    domain: ServiceDomain,
) -> anyhow::Result<PromotionPipeline> {
    let global = loader.load_global()?;
    let environments = loader.load_environments(global.promotion_order(domain)?)?;
    Ok(compose_configured(domain, &global, &environments)?)
}
