// src/render/settings.rs

//! YAML settings documents read through the [`FileSystem`] abstraction.

use std::path::Path;

use serde_yaml::Value;
use tracing::debug;

use crate::errors::{DeployError, Result};
use crate::fs::FileSystem;

/// Key of the supervisor settings document that enables the scheduler job.
pub const SCHEDULER_KEY: &str = "scheduler";

pub fn load_settings(fs: &dyn FileSystem, path: &Path) -> Result<Value> {
    let text = fs.read_to_string(path)?;
    let doc: Value = serde_yaml::from_str(&text)?;
    Ok(doc)
}

/// Read the `scheduler: true|false` switch.
///
/// A missing file, an empty document or a missing key all mean `false`.
pub fn scheduler_enabled(fs: &dyn FileSystem, path: &Path) -> Result<bool> {
    if !fs.is_file(path) {
        debug!(settings = ?path, "supervisor settings not found; scheduler disabled");
        return Ok(false);
    }
    let doc = load_settings(fs, path)?;
    match doc.get(SCHEDULER_KEY) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(DeployError::Config(format!(
            "{:?}: `{}` must be true or false, got {:?}",
            path, SCHEDULER_KEY, other
        ))),
    }
}
