//! CLI command definitions and dispatch.

pub mod plan;
pub mod promote;
pub mod synth;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stackwright_config::loader::ConfigLoader;

/// Stackwright: deployment-topology composer.
#[derive(Parser, Debug)]
#[command(name = "swt", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding `global.yml` and the per-environment documents.
    #[arg(long, global = true, env = "STACKWRIGHT_CONFIG_DIR", default_value = "configs")]
    pub config_dir: PathBuf,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log output formats.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synthesize network and service resource graphs.
    Synth(synth::SynthArgs),
    /// Display the release pipeline of a service domain.
    Plan(plan::PlanArgs),
    /// Promote a service domain through its pipeline stages.
    Promote(promote::PromoteArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let loader = ConfigLoader::new(cli.config_dir);
    match cli.command {
        Command::Synth(args) => synth::execute(&loader, args),
        Command::Plan(args) => plan::execute(&loader, args),
        Command::Promote(args) => promote::execute(&loader, args),
    }
}
