// src/supervisor/conf.rs

//! Generation of the supervisord configuration document.

use std::fmt;
use std::fmt::Write as _;
use std::path::Path;

use regex::Regex;

use crate::errors::Result;
use crate::jobs::{JobDescriptor, JobRegistry};

/// Random token qualifying every program name of one generated config,
/// e.g. `mix_server.3fa9c1`.
///
/// A fresh suffix per deployment keeps the new generation's program groups
/// apart from the ones of a previous generation still known to the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupSuffix(String);

impl GroupSuffix {
    /// Number of random bytes; the suffix is twice as many hex characters.
    pub const BYTES: usize = 3;

    pub fn random() -> Self {
        let bytes: [u8; Self::BYTES] = rand::random();
        Self(hex::encode(bytes))
    }

    /// Wrap an existing suffix, e.g. one read back from a written config.
    pub fn from_existing(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Program name of `job` in this generation.
    pub fn program_name(&self, job: &str) -> String {
        format!("{job}.{}", self.0)
    }
}

impl fmt::Display for GroupSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A generated supervisor config plus what it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedConf {
    pub suffix: GroupSuffix,
    /// `[program:...]` names in document order.
    pub programs: Vec<String>,
    /// Total processes across all programs (`numprocs` summed).
    pub process_count: u32,
    pub text: String,
}

/// Base directory as it appears in the document, without a trailing `/`.
fn base_str(base: &Path) -> String {
    let s = base.display().to_string();
    if s.len() > 1 {
        s.trim_end_matches('/').to_string()
    } else {
        s
    }
}

/// Control socket of the daemon run from `base`.
pub fn socket_path(base: &Path) -> String {
    format!("{}/tmp/sockets/supervisor.sock", base_str(base))
}

/// Render the full document for `jobs` under one `suffix`.
///
/// The output is byte-for-byte stable for the same inputs.
pub fn render_conf(base: &Path, jobs: &[&JobDescriptor], suffix: &GroupSuffix) -> String {
    let base = base_str(base);
    let socket = format!("{base}/tmp/sockets/supervisor.sock");

    let mut out = String::new();
    let _ = write!(
        out,
        "[unix_http_server]
file={socket}
chmod=0770

[supervisord]
logfile={base}/log/supervisord.log
loglevel=info
pidfile={base}/tmp/pids/supervisor.pid
logfile_maxbytes=0
directory={base}

[rpcinterface:supervisor]
supervisor.rpcinterface_factory = supervisor.rpcinterface:make_main_rpcinterface

[supervisorctl]
serverurl=unix://{socket}

"
    );

    for job in jobs {
        write_program(&mut out, &base, job, suffix);
    }
    out.push('\n');
    out
}

fn write_program(out: &mut String, base: &str, job: &JobDescriptor, suffix: &GroupSuffix) {
    let _ = write!(
        out,
        "
[program:{program}]
process_name={name}_%(process_num)02d
command={command}
directory={base}
numprocs={instances}
autostart=false
autorestart=true
startsecs=1
startretries=3
stopsignal=TERM
stopwaitsecs=10
stopasgroup=false
killasgroup=true
stdout_logfile={base}{log_file}
stdout_logfile_maxbytes=0
redirect_stderr=true
environment={environment}
",
        program = suffix.program_name(&job.name),
        name = job.name,
        command = job.command,
        instances = job.instances,
        log_file = job.log_file,
        environment = job.environment,
    );
}

/// Select the jobs for `scheduler_enabled`, draw a fresh suffix and render.
pub fn generate(base: &Path, registry: &JobRegistry, scheduler_enabled: bool) -> GeneratedConf {
    generate_with_suffix(base, registry, scheduler_enabled, GroupSuffix::random())
}

pub fn generate_with_suffix(
    base: &Path,
    registry: &JobRegistry,
    scheduler_enabled: bool,
    suffix: GroupSuffix,
) -> GeneratedConf {
    let jobs = registry.select(scheduler_enabled);
    let text = render_conf(base, &jobs, &suffix);
    GeneratedConf {
        programs: jobs.iter().map(|j| suffix.program_name(&j.name)).collect(),
        process_count: jobs.iter().map(|j| j.instances).sum(),
        suffix,
        text,
    }
}

/// `[program:<name>]` names declared in a config document, in order.
pub fn program_sections(text: &str) -> Result<Vec<String>> {
    let re = Regex::new(r"(?m)^\[program:([^\]\r\n]+)\]\s*$")?;
    Ok(re
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect())
}
