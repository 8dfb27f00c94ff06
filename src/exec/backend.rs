// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! Deploy steps talk to a `CommandRunner` instead of spawning processes
//! themselves. Production code uses [`ProcessRunner`]; tests can provide
//! their own implementation that records the commands and replays canned
//! output.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::errors::{DeployError, Result};

use super::command::{CommandOutput, CommandSpec};
use super::process::run_process;

/// Boxed future returned by the async seams of this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstracting how external commands are executed.
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion.
    ///
    /// `Err` means the command could not be run at all; a non-zero exit is
    /// reported through [`CommandOutput::code`].
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> BoxFuture<'a, Result<CommandOutput>>;
}

/// Run `spec` and turn a non-zero exit into [`DeployError::CommandFailed`].
pub async fn run_checked(runner: &dyn CommandRunner, spec: &CommandSpec) -> Result<CommandOutput> {
    let output = runner.run(spec).await?;
    if !output.success() {
        return Err(DeployError::CommandFailed {
            command: spec.display_line(),
            code: output.code_or_minus_one(),
        });
    }
    debug!(command = %spec, "command succeeded");
    Ok(output)
}

/// Real runner used in production: spawns OS processes with
/// `tokio::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ProcessRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> BoxFuture<'a, Result<CommandOutput>> {
        Box::pin(async move { run_process(spec).await.map_err(DeployError::from) })
    }
}
