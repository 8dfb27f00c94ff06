// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `svdeploy`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "svdeploy",
    version,
    about = "Build, configure and roll out a web application under supervisord.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the deploy manifest (TOML).
    ///
    /// Default: `Deploy.toml` in the current working directory. A missing
    /// manifest means built-in defaults.
    #[arg(long, global = true, value_name = "PATH", default_value = "Deploy.toml")]
    pub manifest: String,

    /// Base directory of the application checkout.
    ///
    /// Overrides `[deploy].base_dir`; defaults to the current directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub base_dir: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SVDEPLOY_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print what would be done, but don't run commands or write files.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Full deployment: build, render configs, regenerate the supervisor
    /// config and roll the jobs.
    Deploy,
    /// Render configs and run the build steps only.
    Build,
    /// Render the configured templates from their YAML settings.
    Render,
    /// Print a freshly generated supervisor config to stdout.
    SupervisorConf {
        /// Include the scheduler job regardless of the settings file.
        #[arg(long)]
        scheduler: bool,
    },
    /// Regenerate the supervisor config and roll the jobs, no build.
    Restart,
    /// Show the jobs known to the running supervisor.
    Status,
    /// Stop every supervised process.
    Stop,
    /// Remove dead program groups from older generations and add missing
    /// ones from the current config.
    Prune,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
