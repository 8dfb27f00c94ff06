// src/deploy/build.rs

//! Source pull and build steps.

use std::path::Path;

use tracing::info;

use crate::config::BuildSection;
use crate::errors::Result;
use crate::exec::{run_checked, CommandRunner, CommandSpec};

/// Shell command for one build line, run from `base` with the build env.
pub fn step_command(base: &Path, build: &BuildSection, line: &str) -> CommandSpec {
    CommandSpec::shell(line).envs(&build.env).cwd(base)
}

/// Run the configured pull command, if any.
pub async fn pull(
    runner: &dyn CommandRunner,
    base: &Path,
    build: &BuildSection,
    dry_run: bool,
) -> Result<()> {
    match build.pull_command() {
        Some(line) => run_line(runner, base, build, line, dry_run).await,
        None => {
            info!("no pull command configured; using the checkout as is");
            Ok(())
        }
    }
}

/// Run every build step in order. The first failing step aborts the rest.
pub async fn run_steps(
    runner: &dyn CommandRunner,
    base: &Path,
    build: &BuildSection,
    dry_run: bool,
) -> Result<()> {
    let total = build.steps.len();
    for (i, line) in build.steps.iter().enumerate() {
        info!(step = i + 1, total, "build step");
        run_line(runner, base, build, line, dry_run).await?;
    }
    Ok(())
}

async fn run_line(
    runner: &dyn CommandRunner,
    base: &Path,
    build: &BuildSection,
    line: &str,
    dry_run: bool,
) -> Result<()> {
    let spec = step_command(base, build, line);
    if dry_run {
        info!(command = %spec, "dry-run: would run");
        return Ok(());
    }
    run_checked(runner, &spec).await?;
    Ok(())
}
