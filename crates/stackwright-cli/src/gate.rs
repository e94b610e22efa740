//! Validation gates run as shell commands.

use std::path::PathBuf;
use std::process::Command;

use stackwright_common::error::{Result, StackwrightError};
use stackwright_common::types::EnvironmentName;
use stackwright_pipeline::{GateOutcome, GateRunner, ValidationGate};

/// Lines of command output kept in a gate's diagnostics.
const DIAGNOSTIC_TAIL_LINES: usize = 20;

/// Runs each gate's own commands through `sh -c`, stopping at the first
/// that exits non-zero.
#[derive(Debug, Clone)]
pub struct ShellGateRunner {
    workdir: PathBuf,
}

impl ShellGateRunner {
    /// Creates a runner executing gate commands from `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn run_command(&self, command: &str) -> Result<std::process::Output> {
        tracing::debug!(command, workdir = %self.workdir.display(), "running gate command");
        Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| StackwrightError::Io {
                path: self.workdir.clone(),
                source: e,
            })
    }
}

impl GateRunner for ShellGateRunner {
    fn run_gate(
        &mut self,
        environment: EnvironmentName,
        gate: &ValidationGate,
    ) -> Result<GateOutcome> {
        let mut transcript = String::new();
        for command in &gate.commands {
            let output = self.run_command(command)?;
            transcript.push_str(&String::from_utf8_lossy(&output.stdout));
            transcript.push_str(&String::from_utf8_lossy(&output.stderr));
            if !output.status.success() {
                tracing::warn!(
                    %environment,
                    gate = %gate.name,
                    command = %command,
                    status = %output.status,
                    "gate command failed"
                );
                return Ok(GateOutcome::fail(format!(
                    "`{command}` exited with {}\n{}",
                    output.status,
                    tail(&transcript)
                )));
            }
        }
        Ok(GateOutcome::pass(tail(&transcript)))
    }
}

fn tail(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    lines[start..].join("\n")
}
