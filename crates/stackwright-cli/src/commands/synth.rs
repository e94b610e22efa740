//! `swt synth`: Synthesize resource graphs as JSON documents.

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Args};
use stackwright_common::types::{EnvironmentName, ServiceDomain};
use stackwright_config::loader::ConfigLoader;
use stackwright_pipeline::{Synthesizer, TopologySynthesizer};

/// Arguments for the `synth` command.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["all", "env"])))]
pub struct SynthArgs {
    /// Synthesize every environment.
    #[arg(long)]
    pub all: bool,

    /// Synthesize a single environment.
    #[arg(long)]
    pub env: Option<EnvironmentName>,

    /// Write one file per stack into this directory instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// One rendered stack.
#[derive(Debug)]
pub struct RenderedStack {
    /// Environment the stack belongs to.
    pub environment: EnvironmentName,
    /// Service domain of the stack.
    pub domain: ServiceDomain,
    /// Rendered topology document.
    pub document: serde_json::Value,
}

impl RenderedStack {
    /// File name used with `--out`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.environment, self.domain)
    }
}

/// Executes the `synth` command.
///
/// Network stacks are synthesized first so that the service stacks can
/// resolve their network and load balancer.
///
/// # Errors
///
/// Returns an error if loading, synthesis, or writing fails.
pub fn execute(loader: &ConfigLoader, args: SynthArgs) -> anyhow::Result<()> {
    let names = match args.env {
        Some(env) if !args.all => vec![env],
        _ => EnvironmentName::ALL.to_vec(),
    };
    let stacks = render(loader, &names)?;

    let Some(out) = args.out else {
        let mut combined = serde_json::Map::new();
        for stack in stacks {
            let entry = combined
                .entry(stack.environment.to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if let serde_json::Value::Object(domains) = entry {
                let _ = domains.insert(stack.domain.to_string(), stack.document);
            }
        }
        println!("{}", serde_json::to_string_pretty(&combined)?);
        return Ok(());
    };

    std::fs::create_dir_all(&out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    for stack in &stacks {
        let path = out.join(stack.file_name());
        std::fs::write(&path, serde_json::to_string_pretty(&stack.document)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "stack written");
    }
    println!("{} stack(s) written to {}", stacks.len(), out.display());
    Ok(())
}

/// Synthesizes and renders the network and compute stacks of `names`.
///
/// # Errors
///
/// Returns an error if a config cannot be loaded or a stack cannot be
/// synthesized.
pub fn render(
    loader: &ConfigLoader,
    names: &[EnvironmentName],
) -> anyhow::Result<Vec<RenderedStack>> {
    let environments = loader.load_environments(names)?;
    let mut synthesizer = TopologySynthesizer::new();
    let mut stacks = Vec::with_capacity(environments.len() * 2);

    for domain in [ServiceDomain::Network, ServiceDomain::Compute] {
        for environment in &environments {
            let graph = synthesizer
                .synthesize(domain, environment)
                .with_context(|| {
                    format!("failed to synthesize {domain} stack for {}", environment.name)
                })?;
            let document = serde_json::to_value(graph.to_document()?)?;
            stacks.push(RenderedStack {
                environment: environment.name,
                domain,
                document,
            });
        }
    }
    Ok(stacks)
}
