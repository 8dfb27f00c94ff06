// src/deploy/reconcile.rs

//! Reconciling the running supervisor with a freshly written config.
//!
//! The decision is a pure function of the status seen *before* the new
//! config was written ([`plan_reconcile`]); [`Reconciler`] carries it out:
//!
//! - rolling reload: `reload`, wait for the new generation, start its jobs
//!   one by one;
//! - cold start: launch the daemon, then the same wait and starts.
//!
//! Every wait polls the status with backoff and gives up after the
//! configured timeout.

use tracing::{info, warn};

use crate::config::WaitPolicy;
use crate::errors::{DeployError, Result};
use crate::supervisor::{GeneratedConf, GroupSuffix, ProcessStatus, StatusQuery, SupervisorControl};
use crate::types::ProcessState;

use super::wait::poll_until;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// The daemon is up: make it re-read the config.
    RollingReload,
    /// The daemon could not be reached: launch it.
    ColdStart,
}

/// Pick the transition from the status seen before the new config.
///
/// A daemon that answers, with or without our jobs, gets a reload; only a
/// failed query leads to launching a new daemon.
pub fn plan_reconcile(existing: &StatusQuery) -> ReconcileMode {
    match existing {
        StatusQuery::Jobs(_) | StatusQuery::NoJobs => ReconcileMode::RollingReload,
        StatusQuery::Failed(_) => ReconcileMode::ColdStart,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub mode: ReconcileMode,
    pub suffix: GroupSuffix,
    /// `name:group` targets started, in order.
    pub started: Vec<String>,
    /// Status after the last start.
    pub final_status: Vec<ProcessStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: Vec<String>,
    pub added: Vec<String>,
}

pub struct Reconciler<'a> {
    ctl: &'a dyn SupervisorControl,
    wait: WaitPolicy,
}

impl<'a> Reconciler<'a> {
    pub fn new(ctl: &'a dyn SupervisorControl, wait: WaitPolicy) -> Self {
        Self { ctl, wait }
    }

    /// Bring the daemon onto `conf`, which must already be written.
    pub async fn reconcile(
        &self,
        existing: &StatusQuery,
        conf: &GeneratedConf,
    ) -> Result<ReconcileReport> {
        let mode = plan_reconcile(existing);
        match (mode, existing) {
            (ReconcileMode::RollingReload, _) => {
                info!(
                    known_jobs = existing.jobs().len(),
                    suffix = %conf.suffix,
                    "supervisor is running; reloading configuration"
                );
                self.ctl.reload().await?;
            }
            (ReconcileMode::ColdStart, StatusQuery::Failed(reason)) => {
                warn!(%reason, "supervisor status unavailable; starting a new daemon");
                self.ctl.launch_daemon().await?;
            }
            (ReconcileMode::ColdStart, _) => {
                info!("starting supervisor daemon");
                self.ctl.launch_daemon().await?;
            }
        }

        let generation = self.wait_for_generation(conf).await?;
        let started = self.start_in_order(&generation).await?;
        let final_status = self.ctl.status().await.jobs().to_vec();

        info!(
            ?mode,
            suffix = %conf.suffix,
            started = started.len(),
            "reconcile complete"
        );
        Ok(ReconcileReport {
            mode,
            suffix: conf.suffix.clone(),
            started,
            final_status,
        })
    }

    /// Poll until every program of `conf` shows up in the status; returns
    /// the rows of those programs in status order.
    pub async fn wait_for_generation(&self, conf: &GeneratedConf) -> Result<Vec<ProcessStatus>> {
        let ctl = self.ctl;
        let programs = &conf.programs;
        let what = format!("programs {} to be loaded", programs.join(", "));

        poll_until(&self.wait, &what, move || async move {
            let query = ctl.status().await;
            let rows: Vec<ProcessStatus> = query
                .jobs()
                .iter()
                .filter(|row| programs.contains(&row.name))
                .cloned()
                .collect();
            let complete = programs
                .iter()
                .all(|p| rows.iter().any(|row| &row.name == p));
            Ok(complete.then_some(rows))
        })
        .await
    }

    /// Start each row that is not already running, waiting for it to reach
    /// `RUNNING` before the next one.
    pub async fn start_in_order(&self, rows: &[ProcessStatus]) -> Result<Vec<String>> {
        let mut started = Vec::new();
        for row in rows {
            let target = row.target();
            if row.status.is_running() {
                info!(%target, "already running; not starting");
                continue;
            }
            info!(%target, "starting job");
            self.ctl.start(&target).await?;
            self.wait_until_running(&target).await?;
            started.push(target);
        }
        Ok(started)
    }

    /// Poll until `target` is `RUNNING`; `FATAL` fails immediately.
    pub async fn wait_until_running(&self, target: &str) -> Result<()> {
        let ctl = self.ctl;
        let what = format!("{target} to be RUNNING");

        poll_until(&self.wait, &what, move || async move {
            let query = ctl.status().await;
            match query.jobs().iter().find(|row| row.target() == target) {
                Some(row) if row.status.is_running() => Ok(Some(())),
                Some(row) if row.status == ProcessState::Fatal => Err(DeployError::JobFailed {
                    job: target.to_string(),
                    status: row.status.to_string(),
                }),
                _ => Ok(None),
            }
        })
        .await
    }

    /// Remove dead program groups that are not in `configured`, and add
    /// configured programs the daemon does not report.
    pub async fn prune(&self, configured: &[String]) -> Result<PruneReport> {
        let rows = match self.ctl.status().await {
            StatusQuery::Failed(reason) => {
                return Err(DeployError::Other(anyhow::anyhow!(
                    "cannot prune, supervisor status unavailable: {reason}"
                )));
            }
            query => query.jobs().to_vec(),
        };

        let mut report = PruneReport::default();

        let mut reported: Vec<&str> = Vec::new();
        for row in rows.iter() {
            if !reported.contains(&row.name.as_str()) {
                reported.push(row.name.as_str());
            }
        }

        for name in reported.iter().copied() {
            if configured.iter().any(|c| c == name) {
                continue;
            }
            let all_dead = rows
                .iter()
                .filter(|r| r.name == name)
                .all(|r| r.status.is_dead());
            if all_dead {
                info!(program = name, "removing dead program group");
                self.ctl.remove(name).await?;
                report.removed.push(name.to_string());
            }
        }

        for program in configured {
            if !reported.contains(&program.as_str()) {
                info!(%program, "adding configured program group");
                self.ctl.add(program).await?;
                report.added.push(program.clone());
            }
        }

        Ok(report)
    }
}
