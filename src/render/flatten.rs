// src/render/flatten.rs

//! Flattening of nested YAML settings into dotted keys.

use std::collections::BTreeMap;

use serde_yaml::Value;

use crate::errors::{DeployError, Result};

/// Dotted key path → leaf value.
pub type FlatSettings = BTreeMap<String, Value>;

/// Flatten a settings document into dotted keys.
///
/// Nested mappings are descended into; sequences, scalars and empty
/// nested mappings are leaves, so every key of the document shows up.
/// An empty document flattens to an empty map. The document root must be
/// a mapping.
pub fn flatten(doc: &Value) -> Result<FlatSettings> {
    let mut out = FlatSettings::new();
    match untag(doc) {
        Value::Null => {}
        Value::Mapping(map) => flatten_into(&mut out, None, map)?,
        other => {
            return Err(DeployError::Config(format!(
                "settings document must be a mapping at the top level, got {}",
                kind_of(other)
            )));
        }
    }
    Ok(out)
}

fn flatten_into(
    out: &mut FlatSettings,
    prefix: Option<&str>,
    map: &serde_yaml::Mapping,
) -> Result<()> {
    for (k, v) in map.iter() {
        let key = key_to_string(k)?;
        let full = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key,
        };
        match untag(v) {
            Value::Mapping(inner) if !inner.is_empty() => {
                flatten_into(out, Some(&full), inner)?
            }
            leaf => {
                out.insert(full, leaf.clone());
            }
        }
    }
    Ok(())
}

fn key_to_string(k: &Value) -> Result<String> {
    match untag(k) {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(DeployError::Config(format!(
            "settings keys must be scalars, got {}",
            kind_of(other)
        ))),
    }
}

fn untag(v: &Value) -> &Value {
    match v {
        Value::Tagged(t) => untag(&t.value),
        other => other,
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Text substituted for a placeholder.
///
/// Strings are wrapped in double quotes; every other leaf is inserted as
/// its plain text. Sequences become their elements joined with `,`.
pub fn format_value(v: &Value) -> String {
    match untag(v) {
        Value::String(s) => format!("\"{s}\""),
        other => plain(other),
    }
}

fn plain(v: &Value) -> String {
    match untag(v) {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => items.iter().map(plain).collect::<Vec<_>>().join(","),
        // Only empty mappings, or mappings nested inside a sequence.
        Value::Mapping(_) | Value::Tagged(_) => String::new(),
    }
}
