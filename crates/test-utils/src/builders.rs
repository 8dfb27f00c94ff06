#![allow(dead_code)]

use std::path::PathBuf;

use svdeploy::config::{JobConfig, Manifest, RawManifest, TemplateEntry, WaitSection};

/// Builder for `Manifest` to simplify test setup.
///
/// Starts from the serde defaults of every section, i.e. what an empty
/// `Deploy.toml` would give.
pub struct ManifestBuilder {
    raw: RawManifest,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawManifest::default(),
        }
    }

    pub fn with_job(mut self, job: JobConfig) -> Self {
        self.raw.jobs.push(job);
        self
    }

    pub fn with_template(mut self, settings: &str, source: &str, destination: &str) -> Self {
        self.raw.templates.push(TemplateEntry {
            settings: PathBuf::from(settings),
            source: PathBuf::from(source),
            destination: PathBuf::from(destination),
        });
        self
    }

    pub fn without_templates(mut self) -> Self {
        self.raw.templates.clear();
        self
    }

    pub fn pull(mut self, line: Option<&str>) -> Self {
        self.raw.build.pull = line.map(str::to_string);
        self
    }

    pub fn build_steps(mut self, steps: &[&str]) -> Self {
        self.raw.build.steps = steps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn supervisor_settings(mut self, path: &str) -> Self {
        self.raw.deploy.supervisor_settings = PathBuf::from(path);
        self
    }

    /// Millisecond waits, so tests that poll finish quickly.
    pub fn fast_wait(mut self) -> Self {
        self.raw.wait = WaitSection {
            initial_ms: 1,
            max_interval_ms: 5,
            factor: 2.0,
            timeout_ms: 200,
        };
        self
    }

    pub fn raw(self) -> RawManifest {
        self.raw
    }

    pub fn build(self) -> Manifest {
        Manifest::try_from(self.raw).expect("Failed to build valid manifest from builder")
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobBuilder {
    job: JobConfig,
}

impl JobBuilder {
    pub fn new(name: &str, command: &str) -> Self {
        Self {
            job: JobConfig {
                name: name.to_string(),
                command: command.to_string(),
                environment: String::new(),
                instances: 1,
                log_file: None,
                requires_scheduler: None,
            },
        }
    }

    pub fn environment(mut self, env: &str) -> Self {
        self.job.environment = env.to_string();
        self
    }

    pub fn instances(mut self, n: u32) -> Self {
        self.job.instances = n;
        self
    }

    pub fn log_file(mut self, path: &str) -> Self {
        self.job.log_file = Some(path.to_string());
        self
    }

    pub fn requires_scheduler(mut self, val: bool) -> Self {
        self.job.requires_scheduler = Some(val);
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
