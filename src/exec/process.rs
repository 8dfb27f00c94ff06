// src/exec/process.rs

//! Single process runner.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use super::command::{CommandOutput, CommandSpec, OutputMode};

/// Run a single process to completion.
///
/// - [`OutputMode::Inherit`]: the child shares our stdout/stderr, like a
///   build tool run from a terminal.
/// - [`OutputMode::Capture`]: stdout is collected and returned, stderr is
///   consumed line by line into the log so its pipe never fills.
pub async fn run_process(spec: &CommandSpec) -> Result<CommandOutput> {
    info!(command = %spec, cwd = ?spec.cwd, "running command");

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).envs(&spec.env).kill_on_drop(true);
    if let Some(ref dir) = spec.cwd {
        cmd.current_dir(dir);
    }

    match spec.output {
        OutputMode::Inherit => {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
        }
        OutputMode::Capture => {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        }
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning `{}`", spec.display_line()))?;

    let stderr_task = child.stderr.take().map(|stderr| {
        let program = spec.program.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(program = %program, "stderr: {}", line);
            }
        })
    });

    let mut stdout = String::new();
    if let Some(mut out) = child.stdout.take() {
        out.read_to_string(&mut stdout)
            .await
            .with_context(|| format!("reading stdout of `{}`", spec.display_line()))?;
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for `{}`", spec.display_line()))?;

    if let Some(task) = stderr_task {
        let _ = task.await;
    }

    debug!(
        command = %spec,
        exit_code = ?status.code(),
        success = status.success(),
        "command exited"
    );

    Ok(CommandOutput {
        code: status.code(),
        stdout,
    })
}
