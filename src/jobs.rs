// src/jobs.rs

//! Job registry: the long-running processes handed to the supervisor.

use crate::config::model::JobConfig;

/// Name of the optional background job switched by `scheduler: true`.
pub const SCHEDULER_JOB: &str = "scheduler";

/// Static definition of one supervised job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub name: String,
    pub command: String,
    /// Opaque `KEY=value,...` string for the supervisor's `environment=`.
    pub environment: String,
    pub instances: u32,
    /// Log file path, relative to the base directory (leading `/`).
    pub log_file: String,
    pub requires_scheduler: bool,
}

impl JobDescriptor {
    pub fn new(name: &str, command: &str, environment: &str) -> Self {
        Self {
            name: name.to_string(),
            command: command.to_string(),
            environment: environment.to_string(),
            instances: 1,
            log_file: default_log_file(name),
            requires_scheduler: name == SCHEDULER_JOB,
        }
    }

    /// True when `program` is this job's supervisor program name, either
    /// bare or qualified by a group suffix (`mix_server.a1b2c3`).
    pub fn owns_program(&self, program: &str) -> bool {
        match program.strip_prefix(self.name.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with('.') && rest.len() > 1,
            None => false,
        }
    }
}

fn default_log_file(name: &str) -> String {
    format!("/log/{name}.log")
}

/// Log paths are kept with exactly one leading `/`, so `{base}{log_file}`
/// in the supervisor config and the workspace seed name the same file.
fn anchored_log_file(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

impl From<JobConfig> for JobDescriptor {
    fn from(cfg: JobConfig) -> Self {
        let requires_scheduler = cfg
            .requires_scheduler
            .unwrap_or(cfg.name == SCHEDULER_JOB);
        let log_file = match cfg.log_file {
            Some(path) => anchored_log_file(&path),
            None => default_log_file(&cfg.name),
        };
        Self {
            name: cfg.name,
            command: cfg.command,
            environment: cfg.environment,
            instances: cfg.instances,
            log_file,
            requires_scheduler,
        }
    }
}

/// Ordered list of job descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRegistry {
    jobs: Vec<JobDescriptor>,
}

impl JobRegistry {
    pub fn new(jobs: Vec<JobDescriptor>) -> Self {
        Self { jobs }
    }

    /// The web server plus the optional scheduler.
    pub fn builtin() -> Self {
        Self::new(vec![
            JobDescriptor::new(
                "mix_server",
                "mix phx.server",
                "PORT=40%(process_num)02d,MIX_ENV=prod",
            ),
            JobDescriptor::new(SCHEDULER_JOB, "mix phx.server", "MIX_ENV=prod,SCHEDULER=true"),
        ])
    }

    pub fn jobs(&self) -> &[JobDescriptor] {
        &self.jobs
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Jobs to deploy for the given scheduler switch, in registry order.
    pub fn select(&self, scheduler_enabled: bool) -> Vec<&JobDescriptor> {
        self.jobs
            .iter()
            .filter(|j| scheduler_enabled || !j.requires_scheduler)
            .collect()
    }

    /// Whether a program name reported by the supervisor belongs to any
    /// registered job.
    pub fn knows_program(&self, program: &str) -> bool {
        self.jobs.iter().any(|j| j.owns_program(program))
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_without_scheduler_returns_primary_only() {
        let reg = JobRegistry::builtin();
        let names: Vec<_> = reg.select(false).iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["mix_server"]);
    }

    #[test]
    fn select_with_scheduler_keeps_registry_order() {
        let reg = JobRegistry::builtin();
        let names: Vec<_> = reg.select(true).iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["mix_server", "scheduler"]);
    }

    #[test]
    fn owns_program_requires_exact_name_or_suffix() {
        let job = JobDescriptor::new("mix_server", "mix phx.server", "");
        assert!(job.owns_program("mix_server"));
        assert!(job.owns_program("mix_server.a1b2c3"));
        assert!(!job.owns_program("mix_server."));
        assert!(!job.owns_program("mix_server_old"));
        assert!(!job.owns_program("mix"));
    }

    #[test]
    fn configured_log_file_gets_one_leading_slash() {
        for given in ["log/web.log", "/log/web.log", "//log/web.log"] {
            let job = JobDescriptor::from(JobConfig {
                name: "web".to_string(),
                command: "bin/web".to_string(),
                environment: String::new(),
                instances: 1,
                log_file: Some(given.to_string()),
                requires_scheduler: None,
            });
            assert_eq!(job.log_file, "/log/web.log", "{given}");
        }
    }

    #[test]
    fn default_log_file_follows_job_name() {
        let job = JobDescriptor::new("worker", "run", "");
        assert_eq!(job.log_file, "/log/worker.log");
        assert!(!job.requires_scheduler);
    }
}
