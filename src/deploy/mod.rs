// src/deploy/mod.rs

//! Deployment orchestration.
//!
//! [`Deployer`] sequences the steps of a deployment:
//!
//! 1. pull the source (`build::pull`)
//! 2. render the config map (`render`)
//! 3. run the build steps (`build::run_steps`)
//! 4. prepare the workspace (`workspace`)
//! 5. generate and write the supervisor config (`supervisor::conf`)
//! 6. reconcile the running jobs (`reconcile`)
//!
//! Each step can also be run on its own from the CLI. All IO goes through
//! the `FileSystem`, `CommandRunner` and `SupervisorControl` seams, so the
//! whole sequence runs in tests against fakes.

pub mod build;
pub mod reconcile;
pub mod wait;
pub mod workspace;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::Manifest;
use crate::errors::Result;
use crate::exec::{CommandRunner, ProcessRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::render::{self, settings, RenderOutcome};
use crate::supervisor::{self, GeneratedConf, StatusQuery, SupervisorControl, SupervisorCtl};

pub use reconcile::{plan_reconcile, PruneReport, ReconcileMode, ReconcileReport, Reconciler};
pub use workspace::{prepare_workspace, WorkspaceReport};

/// Outcome of regenerating the supervisor config and rolling the jobs.
#[derive(Debug, Clone)]
pub struct RestartReport {
    pub conf: GeneratedConf,
    pub conf_path: PathBuf,
    /// Status seen before the new config was written.
    pub existing: StatusQuery,
    pub planned: ReconcileMode,
    /// `None` in a dry run.
    pub reconciled: Option<ReconcileReport>,
}

#[derive(Debug, Clone)]
pub struct DeployReport {
    pub rendered: Vec<RenderOutcome>,
    pub restart: RestartReport,
}

pub struct Deployer {
    manifest: Manifest,
    base_dir: PathBuf,
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CommandRunner>,
    ctl: Arc<dyn SupervisorControl>,
    dry_run: bool,
}

impl Deployer {
    pub fn new(
        manifest: Manifest,
        base_dir: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CommandRunner>,
        ctl: Arc<dyn SupervisorControl>,
        dry_run: bool,
    ) -> Self {
        Self {
            manifest,
            base_dir: base_dir.into(),
            fs,
            runner,
            ctl,
            dry_run,
        }
    }

    /// Production wiring: real filesystem, real processes, real
    /// `supervisorctl`.
    pub fn with_system(manifest: Manifest, base_dir: impl Into<PathBuf>, dry_run: bool) -> Self {
        let base_dir = base_dir.into();
        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner::new());
        let ctl = Arc::new(SupervisorCtl::new(
            Arc::clone(&runner),
            manifest.supervisor.ctl.clone(),
            manifest.supervisor.daemon.clone(),
            manifest.supervisor.conf.clone(),
            base_dir.clone(),
            manifest.registry.clone(),
        ));
        Self::new(
            manifest,
            base_dir,
            Arc::new(RealFileSystem),
            runner,
            ctl,
            dry_run,
        )
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Where the generated supervisor config lives.
    pub fn conf_path(&self) -> PathBuf {
        render::resolve(&self.base_dir, &self.manifest.supervisor.conf)
    }

    /// Full deployment.
    pub async fn deploy(&self) -> Result<DeployReport> {
        info!(base_dir = ?self.base_dir, dry_run = self.dry_run, "deployment started");
        let rendered = self.build().await?;
        let restart = self.restart().await?;
        info!(suffix = %restart.conf.suffix, "deployment finished");
        Ok(DeployReport { rendered, restart })
    }

    /// Pull, render the config map, run the build steps.
    pub async fn build(&self) -> Result<Vec<RenderOutcome>> {
        let b = &self.manifest.build;
        build::pull(self.runner.as_ref(), &self.base_dir, b, self.dry_run).await?;
        let rendered = self.render()?;
        build::run_steps(self.runner.as_ref(), &self.base_dir, b, self.dry_run).await?;
        Ok(rendered)
    }

    /// Render every config-map entry.
    pub fn render(&self) -> Result<Vec<RenderOutcome>> {
        render::render_all(
            self.fs.as_ref(),
            &self.base_dir,
            &self.manifest.templates,
            self.dry_run,
        )
    }

    /// Whether the scheduler job is switched on in the supervisor settings.
    pub fn scheduler_enabled(&self) -> Result<bool> {
        let path = render::resolve(&self.base_dir, &self.manifest.deploy.supervisor_settings);
        settings::scheduler_enabled(self.fs.as_ref(), &path)
    }

    /// Generate a supervisor config without writing it.
    pub fn generate_conf(&self, scheduler_enabled: bool) -> GeneratedConf {
        supervisor::generate(&self.base_dir, &self.manifest.registry, scheduler_enabled)
    }

    /// Regenerate the supervisor config and roll the jobs onto it.
    pub async fn restart(&self) -> Result<RestartReport> {
        let scheduler = self.scheduler_enabled()?;
        workspace::prepare_workspace(
            self.fs.as_ref(),
            &self.base_dir,
            &self.manifest.registry,
            self.dry_run,
        )?;

        let conf = self.generate_conf(scheduler);
        let conf_path = self.conf_path();
        info!(
            suffix = %conf.suffix,
            programs = ?conf.programs,
            scheduler,
            "generated supervisor config"
        );

        let existing = self.ctl.status().await;
        let planned = plan_reconcile(&existing);

        if self.dry_run {
            info!(conf = ?conf_path, ?planned, "dry-run: not writing config or touching supervisor");
            return Ok(RestartReport {
                conf,
                conf_path,
                existing,
                planned,
                reconciled: None,
            });
        }

        self.fs.write(&conf_path, conf.text.as_bytes())?;
        info!(conf = ?conf_path, "wrote supervisor config");

        let reconciled = Reconciler::new(self.ctl.as_ref(), self.manifest.wait)
            .reconcile(&existing, &conf)
            .await?;

        Ok(RestartReport {
            conf,
            conf_path,
            existing,
            planned,
            reconciled: Some(reconciled),
        })
    }

    pub async fn status(&self) -> StatusQuery {
        self.ctl.status().await
    }

    /// Stop every supervised process.
    pub async fn stop(&self) -> Result<()> {
        if self.dry_run {
            info!("dry-run: would stop all supervised processes");
            return Ok(());
        }
        self.ctl.stop("all").await
    }

    /// Reconcile program groups against the config currently on disk.
    pub async fn prune(&self) -> Result<PruneReport> {
        let text = self.fs.read_to_string(&self.conf_path())?;
        let configured = supervisor::program_sections(&text)?;
        if self.dry_run {
            info!(?configured, "dry-run: would prune against these programs");
            return Ok(PruneReport::default());
        }
        Reconciler::new(self.ctl.as_ref(), self.manifest.wait)
            .prune(&configured)
            .await
    }
}
