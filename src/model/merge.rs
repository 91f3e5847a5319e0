// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Strict recursive merge of JSON objects.
//!
//! Fetchers contribute nested detail fragments to the same instance record.
//! Objects are merged key by key; two leaves meeting at the same path must be
//! equal, otherwise the merge fails with the dotted path of the conflict.

use serde_json::{Map, Value};

use crate::errors::MergeConflict;

/// Merge `incoming` into `target`.
///
/// On conflict `target` may already hold the keys merged before the
/// conflicting one; use [`merged`] when the merge must be all-or-nothing.
///
/// ```
/// use fleet_stats::model::dict_merge;
/// use serde_json::json;
///
/// let mut a = json!({"x": {"z": 2}});
/// let b = json!({"x": {"y": 1}});
/// dict_merge(a.as_object_mut().unwrap(), b.as_object().unwrap()).unwrap();
/// assert_eq!(a, json!({"x": {"y": 1, "z": 2}}));
/// ```
pub fn dict_merge(target: &mut Map<String, Value>, incoming: &Map<String, Value>) -> Result<(), MergeConflict> {
    merge_at(target, incoming, &mut Vec::new())
}

/// All-or-nothing variant of [`dict_merge`] returning a new map.
pub fn merged(base: &Map<String, Value>, incoming: &Map<String, Value>) -> Result<Map<String, Value>, MergeConflict> {
    let mut out = base.clone();
    dict_merge(&mut out, incoming)?;
    Ok(out)
}

fn merge_at(
    target: &mut Map<String, Value>,
    incoming: &Map<String, Value>,
    path: &mut Vec<String>,
) -> Result<(), MergeConflict> {
    for (key, value) in incoming {
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), value.clone());
            }
            Some(Value::Object(existing)) if value.is_object() => {
                path.push(key.clone());
                if let Value::Object(incoming_obj) = value {
                    merge_at(existing, incoming_obj, path)?;
                }
                path.pop();
            }
            Some(existing) if *existing == *value => {}
            Some(existing) => {
                let mut full = path.clone();
                full.push(key.clone());
                return Err(MergeConflict {
                    path: full.join("."),
                    existing: existing.clone(),
                    incoming: value.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_disjoint_nested_keys_are_combined() {
        let mut a = obj(json!({"x": {"z": 2}}));
        dict_merge(&mut a, &obj(json!({"x": {"y": 1}}))).unwrap();
        assert_eq!(Value::Object(a), json!({"x": {"y": 1, "z": 2}}));
    }

    #[test]
    fn test_subset_merge_is_idempotent() {
        let original = obj(json!({"version": "1.0", "http": {"status_code": 200, "error": null}}));
        let mut a = original.clone();
        dict_merge(&mut a, &obj(json!({"http": {"status_code": 200}}))).unwrap();
        assert_eq!(a, original);
        dict_merge(&mut a, &original.clone()).unwrap();
        assert_eq!(a, original);
    }

    #[test]
    fn test_leaf_conflict_reports_path() {
        let mut a = obj(json!({"tls": {"grade": "A"}}));
        let err = dict_merge(&mut a, &obj(json!({"tls": {"grade": "B"}}))).unwrap_err();
        assert_eq!(err.path, "tls.grade");
        assert_eq!(err.existing, json!("A"));
        assert_eq!(err.incoming, json!("B"));
        assert!(err.to_string().contains("tls.grade"));
    }

    #[test]
    fn test_object_against_leaf_is_a_conflict() {
        let mut a = obj(json!({"timing": 1.5}));
        let err = dict_merge(&mut a, &obj(json!({"timing": {"initial": 1.5}}))).unwrap_err();
        assert_eq!(err.path, "timing");
    }

    #[test]
    fn test_merged_leaves_base_untouched_on_conflict() {
        let base = obj(json!({"a": 1, "b": 2}));
        let result = merged(&base, &obj(json!({"a": 1, "c": 3, "b": 5})));
        assert!(result.is_err());
        assert_eq!(base, obj(json!({"a": 1, "b": 2})));
    }
}
