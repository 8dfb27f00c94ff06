// src/types.rs

use std::fmt;
use std::str::FromStr;

/// State of a supervised process as printed in the second column of
/// `supervisorctl status`.
///
/// Unrecognised states are kept verbatim in `Other` so a newer supervisor
/// release does not make the status query fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
    Backoff,
    Stopping,
    Exited,
    Fatal,
    Unknown,
    Other(String),
}

impl ProcessState {
    /// States a process will not leave without operator action.
    ///
    /// Program groups in one of these states are candidates for `remove`.
    pub fn is_dead(&self) -> bool {
        matches!(
            self,
            ProcessState::Stopped
                | ProcessState::Exited
                | ProcessState::Fatal
                | ProcessState::Backoff
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ProcessState::Running)
    }
}

impl FromStr for ProcessState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty process state".to_string());
        }
        Ok(match s {
            "STOPPED" => ProcessState::Stopped,
            "STARTING" => ProcessState::Starting,
            "RUNNING" => ProcessState::Running,
            "BACKOFF" => ProcessState::Backoff,
            "STOPPING" => ProcessState::Stopping,
            "EXITED" => ProcessState::Exited,
            "FATAL" => ProcessState::Fatal,
            "UNKNOWN" => ProcessState::Unknown,
            other => ProcessState::Other(other.to_string()),
        })
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::Stopped => "STOPPED",
            ProcessState::Starting => "STARTING",
            ProcessState::Running => "RUNNING",
            ProcessState::Backoff => "BACKOFF",
            ProcessState::Stopping => "STOPPING",
            ProcessState::Exited => "EXITED",
            ProcessState::Fatal => "FATAL",
            ProcessState::Unknown => "UNKNOWN",
            ProcessState::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}
