// src/supervisor/ctl.rs

//! Control interface to the supervisor daemon.
//!
//! The orchestrator talks to a `SupervisorControl` instead of shelling out
//! itself, so tests can drive the rolling restart against a scripted fake.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::errors::Result;
use crate::exec::{run_checked, BoxFuture, CommandRunner, CommandSpec};
use crate::jobs::JobRegistry;

use super::status::StatusQuery;

/// Operations the deployment needs from the supervisor.
pub trait SupervisorControl: Send + Sync {
    /// Query the jobs the daemon knows. Never fails: problems are folded
    /// into [`StatusQuery::Failed`].
    fn status(&self) -> BoxFuture<'_, StatusQuery>;

    /// `start <name:group>`.
    fn start<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<()>>;

    /// `stop <name:group|all>`.
    fn stop<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<()>>;

    /// `add <name>`: activate a program group from the config.
    fn add<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>>;

    /// `remove <name>`: drop a stopped program group.
    fn remove<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>>;

    /// `reload`: restart the daemon on the freshly written config.
    fn reload(&self) -> BoxFuture<'_, Result<()>>;

    /// Launch the daemon itself against the config.
    fn launch_daemon(&self) -> BoxFuture<'_, Result<()>>;
}

/// Real control backed by the `supervisorctl` / `supervisord` binaries.
pub struct SupervisorCtl {
    runner: Arc<dyn CommandRunner>,
    ctl: String,
    daemon: String,
    conf: PathBuf,
    base_dir: PathBuf,
    registry: JobRegistry,
}

impl SupervisorCtl {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        ctl: impl Into<String>,
        daemon: impl Into<String>,
        conf: impl Into<PathBuf>,
        base_dir: impl Into<PathBuf>,
        registry: JobRegistry,
    ) -> Self {
        Self {
            runner,
            ctl: ctl.into(),
            daemon: daemon.into(),
            conf: conf.into(),
            base_dir: base_dir.into(),
            registry,
        }
    }

    fn ctl_command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(self.ctl.clone())
            .arg("-c")
            .arg(self.conf.display().to_string())
            .args(args)
            .cwd(self.base_dir.clone())
            .captured()
    }

    async fn ctl_checked(&self, args: Vec<&str>) -> Result<()> {
        let spec = self.ctl_command(args);
        run_checked(self.runner.as_ref(), &spec).await?;
        Ok(())
    }
}

impl SupervisorControl for SupervisorCtl {
    fn status(&self) -> BoxFuture<'_, StatusQuery> {
        Box::pin(async move {
            let spec = self.ctl_command(["status"]);
            match self.runner.run(&spec).await {
                Ok(out) => StatusQuery::from_output(out.code, &out.stdout, &self.registry),
                Err(e) => {
                    warn!(command = %spec, error = %e, "status query could not be run");
                    StatusQuery::Failed(e.to_string())
                }
            }
        })
    }

    fn start<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.ctl_checked(vec!["start", target]))
    }

    fn stop<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.ctl_checked(vec!["stop", target]))
    }

    fn add<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.ctl_checked(vec!["add", name]))
    }

    fn remove<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.ctl_checked(vec!["remove", name]))
    }

    fn reload(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.ctl_checked(vec!["reload"]))
    }

    fn launch_daemon(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let spec = CommandSpec::new(self.daemon.clone())
                .arg("-c")
                .arg(self.conf.display().to_string())
                .cwd(self.base_dir.clone());
            run_checked(self.runner.as_ref(), &spec).await?;
            Ok(())
        })
    }
}
