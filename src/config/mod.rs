// src/config/mod.rs

//! Deploy manifest loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a manifest from disk (`loader.rs`).
//! - Validate it into a [`Manifest`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_builtin};
pub use model::{
    BuildSection, DeploySection, JobConfig, Manifest, RawManifest, SupervisorSection,
    TemplateEntry, WaitPolicy, WaitSection,
};
