//! Conversion between nested locale documents and flat dot-path maps.

use std::collections::{
    BTreeMap,
    HashSet,
};

use serde_json::{
    Map,
    Value,
};
use thiserror::Error;

use crate::types::LeafValue;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnflattenError {
    /// The same path is both a value and a group of values.
    #[error("'{leaf}' is a value but '{child}' needs it to be a nested group")]
    KeyTypeConflict { leaf: String, child: String },
}

/// Result of flattening a single document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedDocument {
    pub leaves: BTreeMap<String, LeafValue>,
    /// Paths produced more than once within the document, e.g. by both
    /// `{"a.b": ..}` and `{"a": {"b": ..}}`. The later occurrence is kept.
    pub duplicates: Vec<String>,
}

/// Flatten a nested JSON object into a dot-path map.
///
/// Objects are descended into; arrays, empty objects and scalars are leaves.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use i18n_coverage::locale::flatten_json;
/// use i18n_coverage::types::LeafValue;
///
/// let doc = json!({
///     "clinical": {
///         "notes": { "title": "Notes" }
///     }
/// });
///
/// let flattened = flatten_json(&doc, ".");
/// assert_eq!(flattened.leaves.get("clinical.notes.title"), Some(&LeafValue::from("Notes")));
/// ```
#[must_use]
pub fn flatten_json(json: &Value, separator: &str) -> FlattenedDocument {
    let mut result = FlattenedDocument::default();
    flatten_json_value(json, separator, None, &mut result);
    result
}

fn flatten_json_value(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut FlattenedDocument,
) {
    match json {
        Value::Object(map) if !map.is_empty() || prefix.is_none() => {
            for (key, value) in map {
                let full_key =
                    prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        _ => {
            if let Some(key) = prefix
                && result.leaves.insert(key.to_string(), LeafValue::from_json(json)).is_some()
            {
                result.duplicates.push(key.to_string());
            }
        }
    }
}

/// Finds paths that are a leaf while another key nests beneath them.
///
/// Returns `(leaf, child)` pairs in sorted order.
pub fn find_prefix_conflicts<'a>(
    keys: impl IntoIterator<Item = &'a str>,
    separator: &str,
) -> Vec<(String, String)> {
    let keys: Vec<&str> = keys.into_iter().collect();
    let leaf_set: HashSet<&str> = keys.iter().copied().collect();

    let mut conflicts = Vec::new();
    for key in &keys {
        for (index, _) in key.match_indices(separator) {
            let Some(prefix) = key.get(..index) else {
                continue;
            };
            if leaf_set.contains(prefix) {
                conflicts.push((prefix.to_string(), (*key).to_string()));
            }
        }
    }
    conflicts.sort();
    conflicts.dedup();
    conflicts
}

/// Rebuild the nested document for a flat map.
///
/// Inverse of [`flatten_json`] for documents with no leaf/container conflicts.
pub fn unflatten(
    flat: &BTreeMap<String, LeafValue>,
    separator: &str,
) -> Result<Value, UnflattenError> {
    if let Some((leaf, child)) =
        find_prefix_conflicts(flat.keys().map(String::as_str), separator).into_iter().next()
    {
        return Err(UnflattenError::KeyTypeConflict { leaf, child });
    }

    let mut root = Map::new();
    for (key, value) in flat {
        insert_path(&mut root, key, separator, value.to_json());
    }
    Ok(Value::Object(root))
}

fn insert_path(root: &mut Map<String, Value>, key: &str, separator: &str, value: Value) {
    let mut parts = key.split(separator).peekable();
    let mut current = root;
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            current.insert(part.to_string(), value);
            return;
        }
        let entry =
            current.entry(part.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[googletest::test]
    fn test_flatten_json_nested() {
        let json = json!({
            "common": {
                "save": "Save",
                "cancel": "Cancel"
            },
            "errors": {
                "notFound": "Not found"
            }
        });

        let result = flatten_json(&json, ".");

        expect_that!(result.leaves.get("common.save"), some(eq(&LeafValue::from("Save"))));
        expect_that!(result.leaves.get("common.cancel"), some(eq(&LeafValue::from("Cancel"))));
        expect_that!(result.leaves.get("errors.notFound"), some(eq(&LeafValue::from("Not found"))));
        expect_that!(result.leaves.len(), eq(3));
        expect_that!(result.duplicates, is_empty());
    }

    #[googletest::test]
    fn test_flatten_json_custom_separator() {
        let json = json!({ "common": { "hello": "Hello" } });

        let result = flatten_json(&json, "_");

        expect_that!(result.leaves.get("common_hello"), some(eq(&LeafValue::from("Hello"))));
    }

    #[googletest::test]
    fn test_flatten_json_arrays_are_terminal() {
        let json = json!({
            "menu": {
                "items": ["item1", { "name": "item2" }]
            }
        });

        let result = flatten_json(&json, ".");

        expect_that!(
            result.leaves.get("menu.items"),
            some(eq(&LeafValue::Opaque(json!(["item1", { "name": "item2" }]))))
        );
        expect_that!(result.leaves.len(), eq(1));
    }

    #[googletest::test]
    fn test_flatten_json_non_string_values() {
        let json = json!({ "number": 42, "boolean": true, "null": null });

        let result = flatten_json(&json, ".");

        expect_that!(result.leaves.get("number"), some(eq(&LeafValue::Scalar(json!(42)))));
        expect_that!(result.leaves.get("boolean"), some(eq(&LeafValue::Scalar(json!(true)))));
        expect_that!(result.leaves.get("null"), some(eq(&LeafValue::Scalar(json!(null)))));
    }

    #[googletest::test]
    fn test_flatten_json_records_duplicate_paths() {
        let json = json!({
            "a": { "b": "nested" },
            "a.b": "dotted"
        });

        let result = flatten_json(&json, ".");

        expect_that!(result.leaves.len(), eq(1));
        expect_that!(result.duplicates, elements_are![eq("a.b")]);
    }

    #[rstest]
    #[case::flat(json!({ "hello": "Hello", "bye": "Bye" }))]
    #[case::nested(json!({ "a": { "b": { "c": "deep" }, "d": "shallow" } }))]
    #[case::arrays(json!({ "list": ["x", "y"], "grid": [[1, 2], [3]] }))]
    #[case::empty_object(json!({ "group": {}, "other": { "k": "v" } }))]
    #[case::scalars(json!({ "n": 1, "b": false, "z": null }))]
    #[case::empty_document(json!({}))]
    fn unflatten_inverts_flatten(#[case] document: Value) {
        let flattened = flatten_json(&document, ".");

        let rebuilt = unflatten(&flattened.leaves, ".").unwrap();

        assert_eq!(rebuilt, document);
    }

    #[googletest::test]
    fn unflatten_rejects_leaf_container_conflict() {
        let mut flat = BTreeMap::new();
        flat.insert("a".to_string(), LeafValue::from("value"));
        flat.insert("a.b".to_string(), LeafValue::from("child"));

        let result = unflatten(&flat, ".");

        expect_that!(
            result,
            err(eq(&UnflattenError::KeyTypeConflict { leaf: "a".to_string(), child: "a.b".to_string() }))
        );
    }

    #[rstest]
    #[case::none(&["a.b", "a.c", "b"], &[])]
    #[case::direct(&["a", "a.b"], &[("a", "a.b")])]
    #[case::deep(&["a.b", "a.b.c.d"], &[("a.b", "a.b.c.d")])]
    #[case::sibling_prefix(&["ab", "a.b"], &[])]
    fn find_prefix_conflicts_cases(#[case] keys: &[&str], #[case] expected: &[(&str, &str)]) {
        let conflicts = find_prefix_conflicts(keys.iter().copied(), ".");

        let expected: Vec<(String, String)> =
            expected.iter().map(|(l, c)| ((*l).to_string(), (*c).to_string())).collect();
        assert_eq!(conflicts, expected);
    }
}
