// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::jobs::JobRegistry;

/// Validated deploy manifest.
///
/// Built from [`RawManifest`] through `TryFrom` (see `validate.rs`), so the
/// rest of the crate can rely on its invariants: at least one job, unique
/// job names that survive the supervisor's `name:group` notation, and a
/// sane wait policy.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub deploy: DeploySection,
    pub supervisor: SupervisorSection,
    pub wait: WaitPolicy,
    pub build: BuildSection,
    pub templates: Vec<TemplateEntry>,
    pub registry: JobRegistry,
}

impl Manifest {
    pub(crate) fn new_unchecked(
        deploy: DeploySection,
        supervisor: SupervisorSection,
        wait: WaitPolicy,
        build: BuildSection,
        templates: Vec<TemplateEntry>,
        registry: JobRegistry,
    ) -> Self {
        Self {
            deploy,
            supervisor,
            wait,
            build,
            templates,
            registry,
        }
    }

    /// Built-in defaults, used when no manifest file exists.
    pub fn builtin() -> Self {
        Manifest::new_unchecked(
            DeploySection::default(),
            SupervisorSection::default(),
            WaitPolicy::default(),
            BuildSection::default(),
            default_templates(),
            JobRegistry::builtin(),
        )
    }
}

/// Deploy manifest as read from TOML.
///
/// ```toml
/// [deploy]
/// supervisor_settings = "../config/supervisor.yml"
///
/// [supervisor]
/// ctl = "supervisorctl"
/// daemon = "supervisord"
///
/// [build]
/// pull = "git pull origin master"
/// steps = ["mix deps.get --force", "mix compile"]
///
/// [[template]]
/// settings = "../config/application.yml"
/// source = "dply/config/prod.exs"
/// destination = "config/prod.exs"
///
/// [[job]]
/// name = "mix_server"
/// command = "mix phx.server"
/// environment = "PORT=40%(process_num)02d,MIX_ENV=prod"
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawManifest {
    #[serde(default)]
    pub deploy: DeploySection,

    #[serde(default)]
    pub supervisor: SupervisorSection,

    #[serde(default)]
    pub wait: WaitSection,

    #[serde(default)]
    pub build: BuildSection,

    /// `[[template]]` entries; the config map.
    #[serde(default = "default_templates", rename = "template")]
    pub templates: Vec<TemplateEntry>,

    /// `[[job]]` entries. Empty means the built-in registry.
    #[serde(default, rename = "job")]
    pub jobs: Vec<JobConfig>,
}

impl Default for RawManifest {
    fn default() -> Self {
        Self {
            deploy: DeploySection::default(),
            supervisor: SupervisorSection::default(),
            wait: WaitSection::default(),
            build: BuildSection::default(),
            templates: default_templates(),
            jobs: Vec::new(),
        }
    }
}

/// `[deploy]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploySection {
    /// Application checkout; relative paths below resolve against it.
    /// `None` means the current working directory.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// YAML file holding the `scheduler: true|false` switch.
    #[serde(default = "default_supervisor_settings")]
    pub supervisor_settings: PathBuf,
}

fn default_supervisor_settings() -> PathBuf {
    PathBuf::from("../config/supervisor.yml")
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            base_dir: None,
            supervisor_settings: default_supervisor_settings(),
        }
    }
}

/// `[supervisor]` section: the external daemon and its control CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorSection {
    #[serde(default = "default_ctl")]
    pub ctl: String,

    #[serde(default = "default_daemon")]
    pub daemon: String,

    /// Where the generated config is written, relative to the base dir.
    #[serde(default = "default_conf_path")]
    pub conf: PathBuf,
}

fn default_ctl() -> String {
    "supervisorctl".to_string()
}

fn default_daemon() -> String {
    "supervisord".to_string()
}

fn default_conf_path() -> PathBuf {
    PathBuf::from("tmp/supervisor.conf")
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            ctl: default_ctl(),
            daemon: default_daemon(),
            conf: default_conf_path(),
        }
    }
}

/// `[wait]` section, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct WaitSection {
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,

    #[serde(default = "default_factor")]
    pub factor: f64,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_initial_ms() -> u64 {
    250
}

fn default_max_interval_ms() -> u64 {
    2_000
}

fn default_factor() -> f64 {
    2.0
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for WaitSection {
    fn default() -> Self {
        Self {
            initial_ms: default_initial_ms(),
            max_interval_ms: default_max_interval_ms(),
            factor: default_factor(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Exponential backoff used while waiting for the supervisor to converge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitPolicy {
    pub initial: Duration,
    pub max_interval: Duration,
    pub factor: f64,
    pub timeout: Duration,
}

impl From<&WaitSection> for WaitPolicy {
    fn from(w: &WaitSection) -> Self {
        Self {
            initial: Duration::from_millis(w.initial_ms),
            max_interval: Duration::from_millis(w.max_interval_ms),
            factor: w.factor,
            timeout: Duration::from_millis(w.timeout_ms),
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::from(&WaitSection::default())
    }
}

/// `[build]` section: shell steps run before the supervisor is touched.
///
/// `pull` runs first, then the config map is rendered, then `steps`; the
/// rendered files are inputs of the compile steps.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Source update; `pull = ""` skips it.
    #[serde(default = "default_pull")]
    pub pull: Option<String>,

    #[serde(default = "default_build_steps")]
    pub steps: Vec<String>,

    /// Extra environment for every step, including `pull`.
    #[serde(default = "default_build_env")]
    pub env: BTreeMap<String, String>,
}

fn default_pull() -> Option<String> {
    Some("git pull origin master".to_string())
}

fn default_build_steps() -> Vec<String> {
    [
        "mix local.rebar --force",
        "mix local.hex --force",
        "mix deps.get --force",
        "mix compile",
        "mix assets.deploy",
        "mix ecto.setup",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_build_env() -> BTreeMap<String, String> {
    BTreeMap::from([("MIX_ENV".to_string(), "prod".to_string())])
}

impl BuildSection {
    /// The pull command, if one is configured and non-blank.
    pub fn pull_command(&self) -> Option<&str> {
        self.pull.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            pull: default_pull(),
            steps: default_build_steps(),
            env: default_build_env(),
        }
    }
}

/// One `[[template]]` entry: render `source` with `settings` into
/// `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplateEntry {
    pub settings: PathBuf,
    pub source: PathBuf,
    pub destination: PathBuf,
}

fn default_templates() -> Vec<TemplateEntry> {
    vec![TemplateEntry {
        settings: PathBuf::from("../config/application.yml"),
        source: PathBuf::from("dply/config/prod.exs"),
        destination: PathBuf::from("config/prod.exs"),
    }]
}

/// One `[[job]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub name: String,

    pub command: String,

    /// Passed through verbatim to the `environment=` line.
    #[serde(default)]
    pub environment: String,

    #[serde(default = "default_instances")]
    pub instances: u32,

    /// Log target relative to the base dir; defaults to `/log/<name>.log`.
    #[serde(default)]
    pub log_file: Option<String>,

    /// Only deployed when the scheduler switch is on. Defaults to `true`
    /// for a job named `scheduler`.
    #[serde(default)]
    pub requires_scheduler: Option<bool>,
}

fn default_instances() -> u32 {
    1
}
