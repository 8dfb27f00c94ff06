// src/render/mod.rs

//! Config renderer.
//!
//! Reads a YAML settings file, flattens it to dotted keys and substitutes
//! `<%= config["dotted.key"] %>` placeholders in a template, writing the
//! result to a destination file.
//!
//! - [`flatten`] turns nested settings into dotted keys.
//! - [`template`] does the placeholder substitution.
//! - [`settings`] loads YAML documents, including the scheduler switch.

pub mod flatten;
pub mod settings;
pub mod template;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::TemplateEntry;
use crate::errors::Result;
use crate::fs::FileSystem;

pub use flatten::{flatten, format_value, FlatSettings};
pub use template::{placeholder, substitute, unresolved_keys, Substitution};

/// What happened to one template entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The destination was (or, in a dry run, would be) written.
    Rendered {
        destination: PathBuf,
        replacements: usize,
        /// Placeholders left in the output because their key is not in the
        /// settings.
        unresolved: Vec<String>,
    },
    /// The template or the settings file does not exist; the destination
    /// was left untouched.
    Skipped { missing: PathBuf },
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Render one config-map entry.
///
/// Relative paths in `entry` resolve against `base`. With `dry_run` the
/// rendered text is produced but not written.
pub fn render_entry(
    fs: &dyn FileSystem,
    base: &Path,
    entry: &TemplateEntry,
    dry_run: bool,
) -> Result<RenderOutcome> {
    let source = resolve(base, &entry.source);
    let settings_path = resolve(base, &entry.settings);
    let destination = resolve(base, &entry.destination);

    for required in [&source, &settings_path] {
        if !fs.is_file(required) {
            warn!(
                missing = ?required,
                destination = ?destination,
                "skipping config render; input file not found"
            );
            return Ok(RenderOutcome::Skipped {
                missing: required.clone(),
            });
        }
    }

    let template = fs.read_to_string(&source)?;
    let doc = settings::load_settings(fs, &settings_path)?;
    let flat = flatten(&doc)?;
    let Substitution {
        content,
        replacements,
    } = substitute(&template, &flat)?;

    let unresolved = unresolved_keys(&content)?;
    if !unresolved.is_empty() {
        warn!(
            template = ?source,
            keys = ?unresolved,
            "placeholders without a matching settings key were left in place"
        );
    }

    if dry_run {
        info!(destination = ?destination, replacements, "dry-run: would write rendered config");
    } else {
        fs.write(&destination, content.as_bytes())?;
        info!(destination = ?destination, replacements, "rendered config");
    }

    Ok(RenderOutcome::Rendered {
        destination,
        replacements,
        unresolved,
    })
}

/// Render every entry of the config map, in order.
pub fn render_all(
    fs: &dyn FileSystem,
    base: &Path,
    entries: &[TemplateEntry],
    dry_run: bool,
) -> Result<Vec<RenderOutcome>> {
    entries
        .iter()
        .map(|e| render_entry(fs, base, e, dry_run))
        .collect()
}
