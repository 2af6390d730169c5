//! # Dropdowns
//!
//! Every node naming an `entityName` is a dropdown candidate whose options
//! are the related entity's records. Discovery returns node paths so the
//! fetched lists can be applied to a rebuilt tree independently of the
//! order their fetches complete in.

use crate::field::{FieldNode, Layout, NodePath, map_tree, walk};
use serde_json::Value;
use std::collections::BTreeMap;

/// Option text column set on populated dropdowns.
pub const DROPDOWN_TEXT_FIELD: &str = "name";

/// Option value column set on populated dropdowns.
pub const DROPDOWN_VALUE_FIELD: &str = "id";

/// A node whose options come from `entity_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownField {
    pub path: NodePath,
    pub entity_name: String,
}

/// Every node carrying an entity name, parents before children.
pub fn find_dropdown_fields(layout: &[FieldNode]) -> Vec<DropdownField> {
    let mut found = Vec::new();
    walk(layout, &mut |path, node| {
        if let Some(entity) = node.entity() {
            found.push(DropdownField {
                path: path.to_vec(),
                entity_name: entity.to_string(),
            });
        }
    });
    found
}

/// Rebuild `layout` with option lists applied at their node paths.
pub fn apply_dropdown_sources(layout: &[FieldNode], sources: &BTreeMap<NodePath, Vec<Value>>) -> Layout {
    if sources.is_empty() {
        return layout.to_vec();
    }
    map_tree(layout, &mut |path, node| {
        if let Some(options) = sources.get(path) {
            node.data_source = Some(options.clone());
            node.text_field = Some(DROPDOWN_TEXT_FIELD.to_string());
            node.value_field = Some(DROPDOWN_VALUE_FIELD.to_string());
            node.is_value_primitive = Some(true);
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================
