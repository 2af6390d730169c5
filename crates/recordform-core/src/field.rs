//! # Field Metadata Tree
//!
//! The declarative description of a form.
//!
//! Layouts arrive as JSON from the layout source and are parsed into
//! [`FieldNode`] trees. Container nodes (`section`, `tab`, `groupfield`)
//! only group children; every other node is a form field bound to a
//! record column.
//!
//! Passes over a layout never mutate it in place: [`map_tree`] rebuilds
//! the tree and hands each node to a closure together with its path.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A raw entity record as returned by the REST layer.
pub type Record = Map<String, Value>;

/// A complete form description: the top-level nodes of the tree.
pub type Layout = Vec<FieldNode>;

/// Position of a node in a layout: child indices from the root.
pub type NodePath = Vec<usize>;

// =============================================================================
// DATA TYPE
// =============================================================================

/// The kind of a layout node.
///
/// Tags are matched case-insensitively. Tags the engine does not know
/// survive a round-trip through [`DataType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Numeric,
    Guid,
    Date,
    DateTime,
    Boolean,
    Section,
    Tab,
    GroupField,
    Other(String),
}

impl DataType {
    /// Parse a renderer tag.
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "numeric" => Self::Numeric,
            "guid" => Self::Guid,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "boolean" => Self::Boolean,
            "section" => Self::Section,
            "tab" => Self::Tab,
            "groupfield" => Self::GroupField,
            _ => Self::Other(tag.to_string()),
        }
    }

    /// Canonical tag for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Guid => "guid",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Boolean => "boolean",
            Self::Section => "section",
            Self::Tab => "tab",
            Self::GroupField => "groupfield",
            Self::Other(tag) => tag,
        }
    }

    /// Sections, tabs and group fields only hold children.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Section | Self::Tab | Self::GroupField)
    }

    /// Date and datetime fields carry parsed timestamps.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    /// A node without a usable tag.
    pub fn is_untyped(&self) -> bool {
        matches!(self, Self::Other(tag) if tag.is_empty())
    }
}

impl Default for DataType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::parse(&tag))
    }
}

// =============================================================================
// FIELD VALUE
// =============================================================================

/// The runtime value injected into a node by value mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// No record, or the node has no field name.
    Empty,
    /// The record value, untouched.
    Raw(Value),
    /// A date/datetime column parsed as UTC.
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// JSON form of the value, as the renderer binds it.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Empty => Value::String(String::new()),
            Self::Raw(value) => value.clone(),
            Self::Date(date) => Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    /// The parsed timestamp, if this is a date value.
    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Date(date) => Some(date),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(ref s) if s.is_empty() => Self::Empty,
            other => Self::Raw(other),
        })
    }
}

// =============================================================================
// FIELD NODE
// =============================================================================

/// One entry in a layout tree.
///
/// Attributes this engine does not interpret are kept in `extra` so the
/// renderer receives them back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field_name: String,

    #[serde(default)]
    pub data_type: DataType,

    /// Related entity for foreign keys and lookup views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_field: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldNode>,

    /// Name of an alternate layout rendering the related entity inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_view: Option<String>,

    /// The resolved lookup view. Shared by every node naming the same view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_view_template: Option<Arc<Layout>>,

    /// Dropdown options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_value_primitive: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldNode {
    /// Create a form field bound to `field_name`.
    pub fn leaf(field_name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            field_name: field_name.into(),
            data_type,
            ..Self::default()
        }
    }

    /// Create a container holding `fields`.
    pub fn container(data_type: DataType, fields: Vec<FieldNode>) -> Self {
        Self {
            data_type,
            fields,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_entity(mut self, entity_name: impl Into<String>) -> Self {
        self.entity_name = Some(entity_name.into());
        self
    }

    #[must_use]
    pub fn with_lookup_view(mut self, lookup_view: impl Into<String>) -> Self {
        self.lookup_view = Some(lookup_view.into());
        self
    }

    #[must_use]
    pub fn with_value_field(mut self, value_field: impl Into<String>) -> Self {
        self.value_field = Some(value_field.into());
        self
    }

    #[must_use]
    pub fn with_text_field(mut self, text_field: impl Into<String>) -> Self {
        self.text_field = Some(text_field.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn is_container(&self) -> bool {
        self.data_type.is_container()
    }

    /// Related entity name, if set and non-empty.
    pub fn entity(&self) -> Option<&str> {
        self.entity_name.as_deref().filter(|name| !name.is_empty())
    }
}

// =============================================================================
// TREE TRAVERSAL
// =============================================================================

/// Visit every node depth-first, parents before children.
pub fn walk<'a, F>(layout: &'a [FieldNode], f: &mut F)
where
    F: FnMut(&[usize], &'a FieldNode),
{
    fn visit<'a, F>(nodes: &'a [FieldNode], path: &mut NodePath, f: &mut F)
    where
        F: FnMut(&[usize], &'a FieldNode),
    {
        for (index, node) in nodes.iter().enumerate() {
            path.push(index);
            f(path, node);
            visit(&node.fields, path, f);
            path.pop();
        }
    }

    visit(layout, &mut Vec::new(), f);
}

/// Rebuild a layout, letting `f` edit each node before its children.
pub fn map_tree<F>(layout: &[FieldNode], f: &mut F) -> Layout
where
    F: FnMut(&[usize], &mut FieldNode),
{
    fn rebuild<F>(nodes: Vec<FieldNode>, path: &mut NodePath, f: &mut F) -> Layout
    where
        F: FnMut(&[usize], &mut FieldNode),
    {
        nodes
            .into_iter()
            .enumerate()
            .map(|(index, mut node)| {
                path.push(index);
                f(path, &mut node);
                let children = std::mem::take(&mut node.fields);
                node.fields = rebuild(children, path, f);
                path.pop();
                node
            })
            .collect()
    }

    rebuild(layout.to_vec(), &mut Vec::new(), f)
}

// =============================================================================
// TESTS
// =============================================================================
