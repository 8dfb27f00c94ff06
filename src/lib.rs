// src/lib.rs

pub mod cli;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod jobs;
pub mod logging;
pub mod render;
pub mod supervisor;
pub mod types;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_builtin, Manifest};
use crate::deploy::{Deployer, RestartReport};
use crate::render::RenderOutcome;
use crate::supervisor::{ProcessStatus, StatusQuery};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading
/// - base directory resolution
/// - the production `Deployer`
/// - dispatch to the chosen subcommand and printing its result
pub async fn run(args: CliArgs) -> Result<()> {
    let manifest = load_or_builtin(&args.manifest)
        .with_context(|| format!("loading manifest {}", args.manifest))?;
    let base_dir = resolve_base_dir(&args, &manifest)?;
    debug!(?base_dir, manifest = %args.manifest, "resolved deployment");

    let deployer = Deployer::with_system(manifest, base_dir, args.dry_run);

    match args.command {
        Command::Deploy => {
            let report = deployer.deploy().await?;
            print_render_outcomes(&report.rendered);
            print_restart(&report.restart, args.dry_run);
        }
        Command::Build => {
            let rendered = deployer.build().await?;
            print_render_outcomes(&rendered);
        }
        Command::Render => {
            let rendered = deployer.render()?;
            print_render_outcomes(&rendered);
        }
        Command::SupervisorConf { scheduler } => {
            let enabled = scheduler || deployer.scheduler_enabled()?;
            let conf = deployer.generate_conf(enabled);
            print!("{}", conf.text);
        }
        Command::Restart => {
            let report = deployer.restart().await?;
            print_restart(&report, args.dry_run);
        }
        Command::Status => print_query(&deployer.status().await),
        Command::Stop => deployer.stop().await?,
        Command::Prune => {
            let report = deployer.prune().await?;
            for name in report.removed.iter() {
                println!("removed {name}");
            }
            for name in report.added.iter() {
                println!("added {name}");
            }
        }
    }

    Ok(())
}

/// `--base-dir`, else `[deploy].base_dir`, else the current directory.
///
/// The result is absolute, because it ends up in the supervisor config.
fn resolve_base_dir(args: &CliArgs, manifest: &Manifest) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let chosen = args
        .base_dir
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| manifest.deploy.base_dir.clone());
    Ok(match chosen {
        Some(p) if p.is_absolute() => p,
        Some(p) => cwd.join(p),
        None => cwd,
    })
}

fn print_render_outcomes(outcomes: &[RenderOutcome]) {
    for outcome in outcomes {
        match outcome {
            RenderOutcome::Rendered {
                destination,
                replacements,
                unresolved,
            } => {
                println!(
                    "rendered {} ({} replacements)",
                    destination.display(),
                    replacements
                );
                if !unresolved.is_empty() {
                    println!("  unresolved: {}", unresolved.join(", "));
                }
            }
            RenderOutcome::Skipped { missing } => {
                println!("skipped render: {} not found", missing.display());
            }
        }
    }
}

fn print_restart(report: &RestartReport, dry_run: bool) {
    if dry_run {
        println!("supervisor config ({}):", report.conf_path.display());
        print!("{}", report.conf.text);
        println!("planned: {:?}", report.planned);
        return;
    }
    if let Some(ref r) = report.reconciled {
        println!(
            "{:?} to generation {} ({} started)",
            r.mode,
            r.suffix,
            r.started.len()
        );
        print_rows(&r.final_status);
    }
}

fn print_query(query: &StatusQuery) {
    match query {
        StatusQuery::Jobs(rows) => print_rows(rows),
        StatusQuery::NoJobs => println!("supervisor is running no known jobs"),
        StatusQuery::Failed(reason) => {
            warn!(%reason, "status query failed");
            println!("supervisor status unavailable: {reason}");
        }
    }
}

fn print_rows(rows: &[ProcessStatus]) {
    for row in rows {
        println!(
            "{:<40} {:<10} {}",
            row.target(),
            row.status.to_string(),
            row.description
        );
    }
}
