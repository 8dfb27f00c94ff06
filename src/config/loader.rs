// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::model::{Manifest, RawManifest};
use crate::errors::Result;

/// Load a manifest from a given path and return the raw `RawManifest`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawManifest> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let manifest: RawManifest = toml::from_str(&contents)?;

    Ok(manifest)
}

/// Load a manifest from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks job names, wait policy, build steps and template entries.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Manifest> {
    let raw = load_from_path(&path)?;
    let manifest = Manifest::try_from(raw)?;
    Ok(manifest)
}

/// Like [`load_and_validate`], but a manifest that does not exist yields
/// the built-in defaults instead of an IO error.
pub fn load_or_builtin(path: impl AsRef<Path>) -> Result<Manifest> {
    let path = path.as_ref();
    if !path.exists() {
        info!(manifest = ?path, "no deploy manifest found; using built-in defaults");
        return Ok(Manifest::builtin());
    }
    load_and_validate(path)
}
