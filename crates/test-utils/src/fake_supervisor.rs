use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use svdeploy::errors::{DeployError, Result};
use svdeploy::exec::BoxFuture;
use svdeploy::fs::FileSystem;
use svdeploy::fs::mock::MockFileSystem;
use svdeploy::supervisor::{program_sections, ProcessStatus, StatusQuery, SupervisorControl};
use svdeploy::types::ProcessState;

/// A mutating call received by [`FakeSupervisor`]. Status queries are only
/// counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorCall {
    Start(String),
    Stop(String),
    Add(String),
    Remove(String),
    Reload,
    LaunchDaemon,
}

#[derive(Default)]
struct State {
    up: bool,
    rows: Vec<ProcessStatus>,
    /// Programs loaded on the next reload or launch, when no conf file is
    /// attached.
    generation: Vec<String>,
    conf: Option<(MockFileSystem, PathBuf)>,
    /// State a started job ends up in, by job name. Default: RUNNING.
    start_outcome: HashMap<String, ProcessState>,
    calls: Vec<SupervisorCall>,
    status_queries: usize,
}

/// A fake supervisor daemon.
///
/// - `status` reports its rows, `NoJobs` when it has none, and `Failed`
///   while the daemon is down
/// - `reload` / `launch_daemon` replace the rows with one STOPPED process
///   per program of the attached config (or of [`with_generation`])
/// - `start` moves a process to RUNNING, or the scripted state of its job
///
/// Clones share state, so a test keeps one handle for assertions.
///
/// [`with_generation`]: FakeSupervisor::with_generation
#[derive(Clone, Default)]
pub struct FakeSupervisor {
    state: Arc<Mutex<State>>,
}

impl FakeSupervisor {
    /// A daemon that is not running.
    pub fn down() -> Self {
        Self::default()
    }

    /// A running daemon with no programs.
    pub fn up() -> Self {
        let s = Self::default();
        s.state.lock().unwrap().up = true;
        s
    }

    /// A running daemon reporting `rows`.
    pub fn with_rows(rows: Vec<ProcessStatus>) -> Self {
        let s = Self::up();
        s.state.lock().unwrap().rows = rows;
        s
    }

    /// Programs to load on the next reload or launch.
    pub fn with_generation(self, programs: &[&str]) -> Self {
        self.state.lock().unwrap().generation = programs.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Read the programs to load from the config written at `path`.
    pub fn reading_conf(self, fs: &MockFileSystem, path: impl Into<PathBuf>) -> Self {
        self.state.lock().unwrap().conf = Some((fs.clone(), path.into()));
        self
    }

    /// Processes of `job` end up in `state` when started.
    pub fn start_leaves(self, job: &str, state: ProcessState) -> Self {
        self.state
            .lock()
            .unwrap()
            .start_outcome
            .insert(job.to_string(), state);
        self
    }

    pub fn calls(&self) -> Vec<SupervisorCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn status_queries(&self) -> usize {
        self.state.lock().unwrap().status_queries
    }

    pub fn rows(&self) -> Vec<ProcessStatus> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn is_up(&self) -> bool {
        self.state.lock().unwrap().up
    }

    fn record(&self, call: SupervisorCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn load_generation(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let programs = match state.conf {
            Some((ref fs, ref path)) => program_sections(&fs.read_to_string(path)?)?,
            None => state.generation.clone(),
        };
        state.rows = programs.iter().map(|p| stopped_row(p)).collect();
        Ok(())
    }

    fn set_state(&self, target: &str, f: impl Fn(&str) -> ProcessState) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let outcome: Vec<(usize, ProcessState)> = state
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| target == "all" || r.target() == target || r.name == target)
            .map(|(i, r)| (i, f(job_of(&r.name))))
            .collect();
        if outcome.is_empty() {
            return Err(not_found(target));
        }
        for (i, s) in outcome {
            state.rows[i].status = s;
        }
        Ok(())
    }
}

/// One STOPPED process of `program`, named like supervisord names the
/// first process of a group.
pub fn stopped_row(program: &str) -> ProcessStatus {
    row(program, ProcessState::Stopped)
}

pub fn row(program: &str, status: ProcessState) -> ProcessStatus {
    ProcessStatus {
        name: program.to_string(),
        group: Some(format!("{}_00", job_of(program))),
        status,
        description: String::new(),
    }
}

fn job_of(program: &str) -> &str {
    program.split('.').next().unwrap_or(program)
}

fn not_found(target: &str) -> DeployError {
    DeployError::CommandFailed {
        command: format!("supervisorctl {target}"),
        code: 1,
    }
}

impl SupervisorControl for FakeSupervisor {
    fn status(&self) -> BoxFuture<'_, StatusQuery> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.status_queries += 1;
            if !state.up {
                return StatusQuery::Failed(
                    "unix:///srv/app/tmp/sockets/supervisor.sock no such file".to_string(),
                );
            }
            if state.rows.is_empty() {
                StatusQuery::NoJobs
            } else {
                StatusQuery::Jobs(state.rows.clone())
            }
        })
    }

    fn start<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.record(SupervisorCall::Start(target.to_string()));
            let outcomes = self.state.lock().unwrap().start_outcome.clone();
            self.set_state(target, |job| {
                outcomes.get(job).cloned().unwrap_or(ProcessState::Running)
            })
        })
    }

    fn stop<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.record(SupervisorCall::Stop(target.to_string()));
            if target == "all" && self.state.lock().unwrap().rows.is_empty() {
                return Ok(());
            }
            self.set_state(target, |_| ProcessState::Stopped)
        })
    }

    fn add<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.record(SupervisorCall::Add(name.to_string()));
            self.state.lock().unwrap().rows.push(stopped_row(name));
            Ok(())
        })
    }

    fn remove<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.record(SupervisorCall::Remove(name.to_string()));
            let mut state = self.state.lock().unwrap();
            let before = state.rows.len();
            state.rows.retain(|r| r.name != name);
            if state.rows.len() == before {
                return Err(not_found(name));
            }
            Ok(())
        })
    }

    fn reload(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.record(SupervisorCall::Reload);
            if !self.is_up() {
                return Err(not_found("reload"));
            }
            self.load_generation()
        })
    }

    fn launch_daemon(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.record(SupervisorCall::LaunchDaemon);
            if self.is_up() {
                return Err(DeployError::CommandFailed {
                    command: "supervisord".to_string(),
                    code: 2,
                });
            }
            self.load_generation()?;
            self.state.lock().unwrap().up = true;
            Ok(())
        })
    }
}

