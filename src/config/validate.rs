// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{Manifest, RawManifest, WaitPolicy};
use crate::errors::{DeployError, Result};
use crate::jobs::{JobDescriptor, JobRegistry, SCHEDULER_JOB};

impl TryFrom<RawManifest> for Manifest {
    type Error = crate::errors::DeployError;

    fn try_from(raw: RawManifest) -> std::result::Result<Self, Self::Error> {
        validate_raw_manifest(&raw)?;

        let registry = if raw.jobs.is_empty() {
            JobRegistry::builtin()
        } else {
            JobRegistry::new(raw.jobs.into_iter().map(JobDescriptor::from).collect())
        };
        let wait = WaitPolicy::from(&raw.wait);

        Ok(Manifest::new_unchecked(
            raw.deploy,
            raw.supervisor,
            wait,
            raw.build,
            raw.templates,
            registry,
        ))
    }
}

fn validate_raw_manifest(raw: &RawManifest) -> Result<()> {
    validate_jobs(raw)?;
    validate_supervisor(raw)?;
    validate_wait(raw)?;
    validate_build(raw)?;
    validate_templates(raw)?;
    Ok(())
}

fn validate_jobs(raw: &RawManifest) -> Result<()> {
    let mut seen = HashSet::new();
    for job in raw.jobs.iter() {
        let name = job.name.as_str();
        if name.is_empty() {
            return Err(DeployError::Config("[[job]] name must not be empty".to_string()));
        }
        // ':' separates program and process in status output, '.' separates
        // the group suffix.
        if name.contains([':', '.']) || name.chars().any(char::is_whitespace) {
            return Err(DeployError::Config(format!(
                "job name '{}' must not contain ':', '.' or whitespace",
                name
            )));
        }
        if !seen.insert(name) {
            return Err(DeployError::Config(format!("duplicate job '{}'", name)));
        }
        if job.command.trim().is_empty() {
            return Err(DeployError::Config(format!(
                "job '{}' has an empty command",
                name
            )));
        }
        if job
            .log_file
            .as_deref()
            .is_some_and(|p| p.trim_matches('/').trim().is_empty())
        {
            return Err(DeployError::Config(format!(
                "job '{}' has an empty log_file",
                name
            )));
        }
        if job.instances == 0 {
            return Err(DeployError::Config(format!(
                "job '{}' must run at least one instance (got 0)",
                name
            )));
        }
    }

    let all_optional = raw
        .jobs
        .iter()
        .all(|j| j.requires_scheduler.unwrap_or(j.name == SCHEDULER_JOB));
    if !raw.jobs.is_empty() && all_optional {
        return Err(DeployError::Config(
            "at least one [[job]] must run without the scheduler switch".to_string(),
        ));
    }
    Ok(())
}

fn validate_supervisor(raw: &RawManifest) -> Result<()> {
    if raw.supervisor.ctl.trim().is_empty() || raw.supervisor.daemon.trim().is_empty() {
        return Err(DeployError::Config(
            "[supervisor].ctl and [supervisor].daemon must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_wait(raw: &RawManifest) -> Result<()> {
    let w = &raw.wait;
    if w.initial_ms == 0 {
        return Err(DeployError::Config(
            "[wait].initial_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if !w.factor.is_finite() || w.factor < 1.0 {
        return Err(DeployError::Config(format!(
            "[wait].factor must be a finite number >= 1.0 (got {})",
            w.factor
        )));
    }
    if w.max_interval_ms < w.initial_ms {
        return Err(DeployError::Config(format!(
            "[wait].max_interval_ms ({}) must not be below initial_ms ({})",
            w.max_interval_ms, w.initial_ms
        )));
    }
    if w.timeout_ms == 0 {
        return Err(DeployError::Config(
            "[wait].timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_build(raw: &RawManifest) -> Result<()> {
    if let Some(pos) = raw.build.steps.iter().position(|s| s.trim().is_empty()) {
        return Err(DeployError::Config(format!(
            "[build].steps[{}] is empty",
            pos
        )));
    }
    Ok(())
}

fn validate_templates(raw: &RawManifest) -> Result<()> {
    for (i, t) in raw.templates.iter().enumerate() {
        if t.source.as_os_str().is_empty()
            || t.destination.as_os_str().is_empty()
            || t.settings.as_os_str().is_empty()
        {
            return Err(DeployError::Config(format!(
                "[[template]] #{} needs settings, source and destination",
                i
            )));
        }
        if t.source == t.destination {
            return Err(DeployError::Config(format!(
                "[[template]] #{} would overwrite its own source {:?}",
                i, t.source
            )));
        }
    }
    Ok(())
}
