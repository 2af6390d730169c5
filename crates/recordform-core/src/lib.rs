//! # recordform-core
//!
//! The layout engine behind recordform's metadata-driven forms.
//!
//! A form is described by a tree of [`FieldNode`]s (sections, tabs, group
//! fields and leaves). This crate holds every pure transformation the form
//! session needs:
//!
//! - [`projection`]: which record columns a layout needs
//! - [`mapping`]: decorate a layout with values taken from a record
//! - [`flatten`]: nested record ↔ dotted-key form model
//! - [`patch`]: JSON-patch diff for partial updates
//! - [`lookup`]: lookup-view discovery, de-duplication and stitching
//! - [`dropdown`]: foreign-key dropdown discovery and population
//! - [`form`]: the bound form model and its validation
//! - [`text`]: display helpers
//!
//! Nothing here performs I/O. The async client and the form controller
//! live in `recordform-client` and the `recordform` app.

pub mod dropdown;
pub mod field;
pub mod flatten;
pub mod form;
pub mod lookup;
pub mod mapping;
pub mod patch;
pub mod projection;
pub mod text;

pub use dropdown::{DropdownField, apply_dropdown_sources, find_dropdown_fields};
pub use field::{DataType, FieldNode, FieldValue, Layout, NodePath, Record, map_tree, walk};
pub use flatten::{NestedIds, flatten_object, unflatten_object};
pub use form::{FormModel, Violation};
pub use lookup::{
    LookupKey, LookupTemplates, attach_lookup_templates, find_nodes_with_lookup_view,
    unique_lookup_keys,
};
pub use mapping::{
    CompanionLookup, RelatedEntities, ValueMapper, formatted_value, map_field_value,
};
pub use patch::{PatchField, PatchOp, compare, root_level_patch};
pub use projection::get_fields;

use thiserror::Error;

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors raised by the pure layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A value was bound to a name the form does not contain.
    #[error("unknown form field: {0}")]
    UnknownField(String),
}
