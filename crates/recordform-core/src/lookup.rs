//! # Lookup Views
//!
//! Some fields render a related entity through a separate layout (a
//! "lookup view") instead of a flat dropdown.
//!
//! Resolution runs in three steps, the middle one being the caller's I/O:
//!
//! 1. [`find_nodes_with_lookup_view`] lists candidate nodes, depth-first.
//! 2. [`unique_lookup_keys`] keeps the first occurrence of each
//!    `(entityName, lookupView)` pair; each is fetched exactly once.
//! 3. [`attach_lookup_templates`] hands every node naming a fetched pair
//!    the same shared template.
//!
//! The template map lives for one form load and is never persisted.

use crate::field::{FieldNode, Layout, map_tree, walk};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identity of a lookup view.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupKey {
    pub entity_name: String,
    pub lookup_view: String,
}

impl LookupKey {
    pub fn new(entity_name: impl Into<String>, lookup_view: impl Into<String>) -> Self {
        Self {
            entity_name: entity_name.into(),
            lookup_view: lookup_view.into(),
        }
    }

    /// The key a node refers to. Nodes without an entity cannot name a layout.
    pub fn of(node: &FieldNode) -> Option<Self> {
        let view = node.lookup_view.as_deref().filter(|v| !v.is_empty())?;
        let entity = node.entity()?;
        Some(Self::new(entity, view))
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_name, self.lookup_view)
    }
}

/// Resolved lookup views for one form load.
pub type LookupTemplates = BTreeMap<LookupKey, Arc<Layout>>;

/// Every node with a lookup view set, parents before children.
pub fn find_nodes_with_lookup_view(layout: &[FieldNode]) -> Vec<&FieldNode> {
    let mut found = Vec::new();
    walk(layout, &mut |_, node| {
        if node.lookup_view.as_deref().is_some_and(|v| !v.is_empty()) {
            found.push(node);
        }
    });
    found
}

/// The distinct lookup views among `nodes`, in order of first occurrence.
pub fn unique_lookup_keys(nodes: &[&FieldNode]) -> Vec<LookupKey> {
    let keys: Vec<Option<LookupKey>> = nodes.iter().map(|node| LookupKey::of(node)).collect();

    keys.iter()
        .enumerate()
        .filter_map(|(index, key)| {
            let key = key.as_ref()?;
            let first = keys.iter().position(|k| k.as_ref() == Some(key))?;
            (first >= index).then(|| key.clone())
        })
        .collect()
}

/// Rebuild `layout`, sharing each resolved template with every node that names it.
pub fn attach_lookup_templates(layout: &[FieldNode], templates: &LookupTemplates) -> Layout {
    if templates.is_empty() {
        return layout.to_vec();
    }
    map_tree(layout, &mut |_, node| {
        if let Some(template) = LookupKey::of(node).and_then(|key| templates.get(&key)) {
            node.lookup_view_template = Some(Arc::clone(template));
        }
    })
}

// =============================================================================
// TESTS
// =============================================================================
