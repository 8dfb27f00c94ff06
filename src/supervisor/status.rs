// src/supervisor/status.rs

//! Parsing of `supervisorctl status` output.
//!
//! Each row looks like
//!
//! ```text
//! mix_server.3fa9c1:mix_server_00   RUNNING   pid 4242, uptime 0:01:13
//! ```
//!
//! i.e. `name:group`, the state and a free-form description, separated by
//! runs of whitespace.

use crate::jobs::JobRegistry;
use crate::types::ProcessState;

/// One row of the status table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStatus {
    /// Program (group) name before the `:`, e.g. `mix_server.3fa9c1`.
    pub name: String,
    /// Process name after the `:`, e.g. `mix_server_00`. `None` for a
    /// program that is not part of a group.
    pub group: Option<String>,
    pub status: ProcessState,
    pub description: String,
}

impl ProcessStatus {
    /// Argument for `supervisorctl start|stop`.
    pub fn target(&self) -> String {
        match self.group {
            Some(ref g) => format!("{}:{}", self.name, g),
            None => self.name.clone(),
        }
    }
}

/// Parse one status row, without judging whether it is one of ours.
pub fn parse_status_line(line: &str) -> Option<ProcessStatus> {
    let mut parts = line.trim().splitn(2, char::is_whitespace);
    let first = parts.next()?;
    let rest = parts.next()?.trim_start();

    let mut rest_parts = rest.splitn(2, char::is_whitespace);
    let state = rest_parts.next()?;
    let description = rest_parts.next().unwrap_or("").trim().to_string();

    let status: ProcessState = state.parse().ok()?;
    let (name, group) = match first.split_once(':') {
        Some((n, g)) => (n, Some(g)),
        None => (first, None),
    };
    if name.is_empty() || group.is_some_and(str::is_empty) {
        return None;
    }

    Some(ProcessStatus {
        name: name.to_string(),
        group: group.map(str::to_string),
        status,
        description,
    })
}

/// Parse a whole status report, keeping only rows of registered jobs.
pub fn parse_status_output(text: &str, registry: &JobRegistry) -> Vec<ProcessStatus> {
    text.lines()
        .filter_map(parse_status_line)
        .filter(|p| registry.knows_program(&p.name))
        .collect()
}

/// Result of asking the daemon which jobs it knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusQuery {
    /// At least one row belonging to a registered job.
    Jobs(Vec<ProcessStatus>),
    /// The daemon answered but reported none of our jobs.
    NoJobs,
    /// The status command could not be run or its output was unusable
    /// (typically: the daemon is not running).
    Failed(String),
}

impl StatusQuery {
    /// Build the outcome from a finished status command.
    ///
    /// `supervisorctl status` exits non-zero as soon as one process is not
    /// running, so rows are trusted whatever the exit code. Without rows, a
    /// zero exit means an empty daemon and anything else a failure.
    pub fn from_output(code: Option<i32>, stdout: &str, registry: &JobRegistry) -> Self {
        let jobs = parse_status_output(stdout, registry);
        if !jobs.is_empty() {
            return StatusQuery::Jobs(jobs);
        }
        if code == Some(0) {
            return StatusQuery::NoJobs;
        }
        let reason = stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("status exited with {code:?} and no output"));
        StatusQuery::Failed(reason)
    }

    /// Rows, empty unless this is [`StatusQuery::Jobs`].
    pub fn jobs(&self) -> &[ProcessStatus] {
        match self {
            StatusQuery::Jobs(jobs) => jobs,
            StatusQuery::NoJobs | StatusQuery::Failed(_) => &[],
        }
    }
}
