//! # Patch Diff
//!
//! JSON-patch generation for partial updates.
//!
//! [`compare`] walks two documents and emits `replace`/`remove` operations
//! for existing members (last member first) followed by `add` operations
//! for new members. Objects and arrays are descended into when both sides
//! have the same shape.
//!
//! Edits only patch the root record: [`root_level_patch`] keeps
//! operations whose path is a single segment with no `.` in it.

use crate::field::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-patch operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Remove,
    Replace,
}

/// One JSON-patch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchField {
    pub op: PatchOp,
    /// JSON pointer to the member.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchField {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: PatchOp::Remove,
            path: path.into(),
            value: None,
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: PatchOp::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    /// A single-segment path naming a plain (non-dotted) column.
    pub fn is_root_level(&self) -> bool {
        match self.path.strip_prefix('/') {
            Some(segment) => !segment.contains('/') && !segment.contains('.'),
            None => false,
        }
    }
}

/// Diff two documents.
pub fn compare(old: &Value, new: &Value) -> Vec<PatchField> {
    let mut patches = Vec::new();
    generate(old, new, &mut patches, "");
    patches
}

/// Diff an original flattened record against the rebuilt one, keeping
/// only root-level operations.
pub fn root_level_patch(original: &Record, updated: &Record) -> Vec<PatchField> {
    compare(&Value::Object(original.clone()), &Value::Object(updated.clone()))
        .into_iter()
        .filter(PatchField::is_root_level)
        .collect()
}

fn generate(old: &Value, new: &Value, patches: &mut Vec<PatchField>, path: &str) {
    if old == new {
        return;
    }

    let old_keys = member_keys(old);
    let new_keys = member_keys(new);
    let mut deleted = false;

    for key in old_keys.iter().rev() {
        let Some(old_val) = member(old, key) else {
            continue;
        };
        let child_path = format!("{}/{}", path, escape_pointer(key));

        match member(new, key) {
            Some(new_val) => {
                if same_container_shape(old_val, new_val) {
                    generate(old_val, new_val, patches, &child_path);
                } else if old_val != new_val {
                    patches.push(PatchField::replace(child_path, new_val.clone()));
                }
            }
            None if old.is_array() == new.is_array() => {
                patches.push(PatchField::remove(child_path));
                deleted = true;
            }
            None => {
                patches.push(PatchField::replace(path, new.clone()));
            }
        }
    }

    if !deleted && new_keys.len() == old_keys.len() {
        return;
    }

    for key in &new_keys {
        if member(old, key).is_none() {
            if let Some(new_val) = member(new, key) {
                let child_path = format!("{}/{}", path, escape_pointer(key));
                patches.push(PatchField::add(child_path, new_val.clone()));
            }
        }
    }
}

fn member_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn member<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn same_container_shape(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    )
}

fn escape_pointer(segment: &str) -> String {
    if segment.contains(['~', '/']) {
        segment.replace('~', "~0").replace('/', "~1")
    } else {
        segment.to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn identical_documents_produce_no_ops() {
        let doc = json!({"a": 1, "b": {"c": [1, 2]}});
        assert!(compare(&doc, &doc).is_empty());
    }

    #[test]
    fn replace_remove_add() {
        let old = json!({"a": 1, "b": 2});
        let new = json!({"a": 5, "c": 3});

        let ops = compare(&old, &new);

        assert_eq!(
            ops,
            vec![
                PatchField::remove("/b"),
                PatchField::replace("/a", json!(5)),
                PatchField::add("/c", json!(3)),
            ]
        );
    }

    #[test]
    fn nested_objects_are_descended() {
        let old = json!({"addr": {"street": "Old", "city": "Leeds"}});
        let new = json!({"addr": {"street": "New", "city": "Leeds"}});

        assert_eq!(
            compare(&old, &new),
            vec![PatchField::replace("/addr/street", json!("New"))]
        );
    }

    #[test]
    fn object_replaced_by_scalar() {
        let old = json!({"a": {"b": 1}});
        let new = json!({"a": null});
        assert_eq!(compare(&old, &new), vec![PatchField::replace("/a", Value::Null)]);
    }

    #[test]
    fn array_growth_adds_index() {
        let old = json!({"tags": ["a"]});
        let new = json!({"tags": ["a", "b"]});
        assert_eq!(compare(&old, &new), vec![PatchField::add("/tags/1", json!("b"))]);
    }

    #[test]
    fn pointer_segments_are_escaped() {
        let old = json!({"a/b": 1, "c~d": 1});
        let new = json!({"a/b": 2, "c~d": 2});
        let paths: Vec<_> = compare(&old, &new).into_iter().map(|p| p.path).collect();
        assert_eq!(paths, vec!["/c~0d", "/a~1b"]);
    }

    #[test]
    fn root_level_patch_drops_nested_and_dotted_paths() {
        let original = record(json!({
            "Id": "123",
            "FirstName": "Ada",
            "LocationId_Location": {"id": "l1", "name": "Ward 4"},
            "LocationId_Location.name": "Ward 4"
        }));
        let updated = record(json!({
            "Id": "123",
            "FirstName": "Grace",
            "LocationId_Location": {"id": "l1", "name": "Ward 5"},
            "LocationId_Location.name": "Ward 5"
        }));

        let patch = root_level_patch(&original, &updated);

        assert_eq!(patch, vec![PatchField::replace("/FirstName", json!("Grace"))]);
    }

    #[test]
    fn root_level_patch_keeps_removals() {
        let original = record(json!({"FirstName": "Ada", "Mobile": "0700"}));
        let updated = record(json!({"FirstName": "Ada"}));

        assert_eq!(
            root_level_patch(&original, &updated),
            vec![PatchField::remove("/Mobile")]
        );
    }

    #[test]
    fn remove_serializes_without_value() {
        let json = serde_json::to_value(PatchField::remove("/Email")).unwrap();
        assert_eq!(json, json!({"op": "remove", "path": "/Email"}));
    }

    #[test]
    fn replace_serializes_with_value() {
        let json = serde_json::to_value(PatchField::replace("/Age", json!(42))).unwrap();
        assert_eq!(json, json!({"op": "replace", "path": "/Age", "value": 42}));
    }
}
