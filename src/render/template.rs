// src/render/template.rs

use regex::{NoExpand, Regex};

use crate::errors::Result;
use crate::render::flatten::{format_value, FlatSettings};

/// The placeholder text for one dotted key.
pub fn placeholder(key: &str) -> String {
    format!("<%= config[\"{key}\"] %>")
}

/// Result of substituting settings into a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub content: String,
    /// Number of placeholders replaced, over all keys.
    pub replacements: usize,
}

/// Replace every `<%= config["<key>"] %>` whose key is in `settings`.
///
/// The key is escaped before it goes into the pattern, so dots and other
/// metacharacters match literally; the value is inserted literally too.
/// Text without a matching placeholder is left as it was.
pub fn substitute(template: &str, settings: &FlatSettings) -> Result<Substitution> {
    let mut content = template.to_string();
    let mut replacements = 0;

    for (key, value) in settings.iter() {
        let re = Regex::new(&regex::escape(&placeholder(key)))?;
        let hits = re.find_iter(&content).count();
        if hits == 0 {
            continue;
        }
        let replacement = format_value(value);
        content = re
            .replace_all(&content, NoExpand(&replacement))
            .into_owned();
        replacements += hits;
    }

    Ok(Substitution {
        content,
        replacements,
    })
}

const ANY_PLACEHOLDER: &str = r#"<%=\s*config\["([^"]*)"\]\s*%>"#;

/// Keys of placeholders still present in `content`, deduplicated, in
/// order of first appearance.
pub fn unresolved_keys(content: &str) -> Result<Vec<String>> {
    let re = Regex::new(ANY_PLACEHOLDER)?;
    let mut keys: Vec<String> = Vec::new();
    for caps in re.captures_iter(content) {
        let key = &caps[1];
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    Ok(keys)
}
