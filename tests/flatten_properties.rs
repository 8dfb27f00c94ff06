// tests/flatten_properties.rs

use proptest::prelude::*;
use serde_yaml::{Mapping, Value};
use svdeploy::render::{flatten, placeholder, substitute, unresolved_keys};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        any::<bool>().prop_map(Value::Bool),
        "[a-z ]{0,8}".prop_map(Value::String),
        Just(Value::Mapping(Mapping::new())),
    ]
}

// Nested settings documents: mappings up to three levels deep with plain
// lowercase keys. Empty mappings only appear as leaves.
fn settings_tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 32, 4, |inner| {
        proptest::collection::btree_map("[a-z]{1,6}", inner, 1..4).prop_map(|m| {
            let mut mapping = Mapping::new();
            for (k, v) in m {
                mapping.insert(Value::String(k), v);
            }
            Value::Mapping(mapping)
        })
    })
}

fn root_document() -> impl Strategy<Value = Value> {
    proptest::collection::btree_map("[a-z]{1,6}", settings_tree(), 1..5).prop_map(|m| {
        let mut mapping = Mapping::new();
        for (k, v) in m {
            mapping.insert(Value::String(k), v);
        }
        Value::Mapping(mapping)
    })
}

/// Dotted paths of every leaf, computed independently of `flatten`.
fn leaf_paths(v: &Value, prefix: &str, out: &mut Vec<String>) {
    match v {
        Value::Mapping(m) if !m.is_empty() => {
            for (k, child) in m.iter() {
                let k = k.as_str().unwrap_or_default();
                let path = if prefix.is_empty() {
                    k.to_string()
                } else {
                    format!("{prefix}.{k}")
                };
                leaf_paths(child, &path, out);
            }
        }
        _ => out.push(prefix.to_string()),
    }
}

proptest! {
    #[test]
    fn every_leaf_gets_exactly_one_dotted_key(doc in root_document()) {
        let flat = flatten(&doc).unwrap();
        let mut expected = Vec::new();
        leaf_paths(&doc, "", &mut expected);
        expected.sort();

        let keys: Vec<String> = flat.keys().cloned().collect();
        prop_assert_eq!(keys, expected);
    }

    #[test]
    fn flattening_a_flat_document_changes_nothing(doc in root_document()) {
        let flat = flatten(&doc).unwrap();

        let mut mapping = Mapping::new();
        for (k, v) in flat.iter() {
            mapping.insert(Value::String(k.clone()), v.clone());
        }
        let again = flatten(&Value::Mapping(mapping)).unwrap();
        prop_assert_eq!(again, flat);
    }

    #[test]
    fn template_of_all_keys_resolves_completely(doc in root_document()) {
        let flat = flatten(&doc).unwrap();
        let template: String = flat
            .keys()
            .map(|k| format!("{} = {}\n", k, placeholder(k)))
            .collect();

        let out = substitute(&template, &flat).unwrap();
        prop_assert_eq!(out.replacements, flat.len());
        prop_assert!(unresolved_keys(&out.content).unwrap().is_empty());
    }
}

#[test]
fn leaf_paths_helper_matches_a_known_document() {
    let doc: Value =
        serde_yaml::from_str("a:\n  b: 1\n  c:\n    d: x\ne: true\nf: {}\n").unwrap();
    let mut paths = Vec::new();
    leaf_paths(&doc, "", &mut paths);
    assert_eq!(paths, vec!["a.b", "a.c.d", "e", "f"]);
}
