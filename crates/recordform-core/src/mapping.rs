//! # Value Mapping
//!
//! Decorates a layout with runtime values taken from a record.
//!
//! Every named node receives a [`FieldValue`]. Date and datetime nodes
//! are tagged with a display format and their values parsed as UTC; guid
//! nodes pick up a matching related-entity list as their data source. A
//! value that cannot be interpreted is passed through as-is: mapping never
//! fails.

use crate::field::{DataType, FieldNode, FieldValue, Layout, Record, map_tree};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

/// Display format attached to `date` nodes.
pub const DATE_FORMAT: &str = "MM/dd/yyyy";

/// Display format attached to `datetime` nodes.
pub const DATE_TIME_FORMAT: &str = "MM/dd/yyyy hh:mm a";

/// Placeholder in upload URLs replaced with the API base URL.
pub const BASE_URL_PLACEHOLDER: &str = "BASEURL";

/// Related-entity lists keyed by entity name.
pub type RelatedEntities = BTreeMap<String, Vec<Value>>;

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// How a guid node finds its companion navigation property in preview.
///
/// Layouts in the wild were built against `FieldNameTwice`
/// (`<fieldName>_<fieldName>`), which only matches when the field is
/// named after its entity. `EntityName` searches
/// `<fieldName>_<entityName>` instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompanionLookup {
    #[default]
    FieldNameTwice,
    EntityName,
}

// =============================================================================
// VALUE MAPPER
// =============================================================================

/// Configurable value-mapping pass.
#[derive(Debug, Clone, Default)]
pub struct ValueMapper<'a> {
    record: Option<&'a Record>,
    related: Option<&'a RelatedEntities>,
    preview: bool,
    base_url: &'a str,
    companion: CompanionLookup,
}

impl<'a> ValueMapper<'a> {
    /// A mapper for `record`. `None` maps every node to an empty value.
    pub fn new(record: Option<&'a Record>) -> Self {
        Self {
            record,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn related(mut self, related: &'a RelatedEntities) -> Self {
        self.related = Some(related);
        self
    }

    /// Show foreign keys by their referenced record's text.
    #[must_use]
    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    /// Base URL substituted for [`BASE_URL_PLACEHOLDER`].
    #[must_use]
    pub fn base_url(mut self, base_url: &'a str) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn companion_lookup(mut self, companion: CompanionLookup) -> Self {
        self.companion = companion;
        self
    }

    /// Rebuild `layout` with values, formats and data sources applied.
    pub fn map(&self, layout: &[FieldNode]) -> Layout {
        map_tree(layout, &mut |_, node| {
            match node.data_type {
                DataType::Guid => {
                    let related = self
                        .related
                        .and_then(|related| related.get(node.entity_name.as_deref().unwrap_or("")));
                    if let Some(list) = related {
                        node.data_source = Some(list.clone());
                    }
                }
                DataType::Date => node.format = Some(DATE_FORMAT.to_string()),
                DataType::DateTime => node.format = Some(DATE_TIME_FORMAT.to_string()),
                _ => {}
            }

            node.remove_url = node.remove_url.take().map(|url| self.resolve_url(url));
            node.save_url = node.save_url.take().map(|url| self.resolve_url(url));

            node.value = Some(if node.field_name.is_empty() {
                FieldValue::Empty
            } else {
                self.formatted_value(node)
            });
        })
    }

    /// The value `node` shows for the mapper's record.
    pub fn formatted_value(&self, node: &FieldNode) -> FieldValue {
        let Some(record) = self.record else {
            return FieldValue::Empty;
        };
        if node.field_name.is_empty() || node.data_type.is_untyped() {
            return FieldValue::Empty;
        }

        let data = record.get(&node.field_name).cloned().unwrap_or(Value::Null);

        match node.data_type {
            DataType::Guid if self.preview => self
                .companion_text(record, node)
                .map(FieldValue::Raw)
                .unwrap_or(FieldValue::Raw(data)),
            DataType::Date | DataType::DateTime => match data.as_str().and_then(parse_utc) {
                Some(date) => FieldValue::Date(date),
                None => FieldValue::Raw(data),
            },
            _ => FieldValue::Raw(data),
        }
    }

    fn companion_text(&self, record: &Record, node: &FieldNode) -> Option<Value> {
        let suffix = match self.companion {
            CompanionLookup::FieldNameTwice => node.field_name.as_str(),
            CompanionLookup::EntityName => node.entity()?,
        };
        let wanted = format!("{}_{}", node.field_name, suffix).to_lowercase();
        let (_, reference) = record.iter().find(|(key, _)| key.to_lowercase() == wanted)?;
        let text_field = node.text_field.as_deref()?;
        reference.get(text_field).filter(|text| !text.is_null()).cloned()
    }

    fn resolve_url(&self, url: String) -> String {
        match url.strip_prefix(BASE_URL_PLACEHOLDER) {
            Some(rest) => format!("{}{}", self.base_url, rest),
            None => url,
        }
    }
}

// =============================================================================
// FREE FUNCTIONS
// =============================================================================

/// Map `record` into `layout` with default options.
pub fn map_field_value(
    layout: &[FieldNode],
    record: Option<&Record>,
    related: &RelatedEntities,
    is_preview: bool,
) -> Layout {
    ValueMapper::new(record)
        .related(related)
        .preview(is_preview)
        .map(layout)
}

/// The value a single node shows for `record`.
pub fn formatted_value(record: Option<&Record>, node: &FieldNode, is_preview: bool) -> FieldValue {
    ValueMapper::new(record).preview(is_preview).formatted_value(node)
}

/// Parse a timestamp string as UTC.
///
/// Strings without an offset are read as UTC. Strings that carry one
/// are converted to UTC.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(date.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
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
    fn date_field_gets_format_and_parsed_value() {
        let layout = vec![FieldNode::leaf("Dob", DataType::Date)];
        let rec = record(json!({"Dob": "2024-01-01"}));

        let mapped = map_field_value(&layout, Some(&rec), &RelatedEntities::new(), false);

        assert_eq!(mapped[0].format.as_deref(), Some("MM/dd/yyyy"));
        let date = mapped[0].value.as_ref().and_then(FieldValue::as_date).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn datetime_field_gets_time_format() {
        let layout = vec![FieldNode::leaf("RegisteredOn", DataType::DateTime)];
        let rec = record(json!({"RegisteredOn": "2024-03-05T14:30:00"}));

        let mapped = map_field_value(&layout, Some(&rec), &RelatedEntities::new(), false);

        assert_eq!(mapped[0].format.as_deref(), Some("MM/dd/yyyy hh:mm a"));
        let date = mapped[0].value.as_ref().and_then(FieldValue::as_date).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-05T14:30:00+00:00");
    }

    #[test]
    fn unparsable_date_is_returned_unchanged() {
        let node = FieldNode::leaf("Dob", DataType::Date);
        let rec = record(json!({"Dob": "not a date"}));
        assert_eq!(
            formatted_value(Some(&rec), &node, false),
            FieldValue::Raw(json!("not a date"))
        );
    }

    #[test]
    fn missing_record_maps_empty_values() {
        let layout = vec![FieldNode::container(
            DataType::Section,
            vec![FieldNode::leaf("FirstName", DataType::String)],
        )];

        let mapped = map_field_value(&layout, None, &RelatedEntities::new(), false);

        assert_eq!(mapped[0].value, Some(FieldValue::Empty));
        assert_eq!(mapped[0].fields[0].value, Some(FieldValue::Empty));
    }

    #[test]
    fn missing_column_maps_to_null() {
        let node = FieldNode::leaf("MiddleName", DataType::String);
        let rec = record(json!({"FirstName": "Ada"}));
        assert_eq!(formatted_value(Some(&rec), &node, false), FieldValue::Raw(Value::Null));
    }

    #[test]
    fn guid_takes_related_entity_list() {
        let layout = vec![FieldNode::leaf("Gender", DataType::Guid).with_entity("Gender")];
        let mut related = RelatedEntities::new();
        related.insert("Gender".into(), vec![json!({"id": "g1", "name": "Female"})]);

        let mapped = map_field_value(&layout, None, &related, false);

        assert_eq!(
            mapped[0].data_source,
            Some(vec![json!({"id": "g1", "name": "Female"})])
        );
    }

    #[test]
    fn guid_keeps_existing_data_source_without_match() {
        let mut node = FieldNode::leaf("Title", DataType::Guid).with_entity("Title");
        node.data_source = Some(vec![json!({"id": "t1"})]);

        let mapped = map_field_value(&[node], None, &RelatedEntities::new(), false);

        assert_eq!(mapped[0].data_source, Some(vec![json!({"id": "t1"})]));
    }

    #[test]
    fn preview_guid_reads_companion_text() {
        let node = FieldNode::leaf("Gender", DataType::Guid)
            .with_entity("Gender")
            .with_text_field("name");
        let rec = record(json!({
            "Gender": "g1",
            "gender_gender": {"id": "g1", "name": "Female"}
        }));

        assert_eq!(
            formatted_value(Some(&rec), &node, true),
            FieldValue::Raw(json!("Female"))
        );
    }

    #[test]
    fn preview_guid_falls_back_to_raw_id() {
        let node = FieldNode::leaf("LocationId", DataType::Guid)
            .with_entity("Location")
            .with_text_field("name");
        let rec = record(json!({
            "LocationId": "l1",
            "LocationId_Location": {"id": "l1", "name": "Ward 4"}
        }));

        // The default lookup searches LocationId_LocationId.
        assert_eq!(
            formatted_value(Some(&rec), &node, true),
            FieldValue::Raw(json!("l1"))
        );

        let by_entity = ValueMapper::new(Some(&rec))
            .preview(true)
            .companion_lookup(CompanionLookup::EntityName)
            .formatted_value(&node);
        assert_eq!(by_entity, FieldValue::Raw(json!("Ward 4")));
    }

    #[test]
    fn base_url_placeholder_is_replaced() {
        let mut node = FieldNode::leaf("Prescription", DataType::Other("file".into()));
        node.save_url = Some("BASEURL/api/file/upload".into());
        node.remove_url = Some("https://cdn.example/remove".into());

        let mapped = ValueMapper::new(None)
            .base_url("https://clinic.example")
            .map(&[node]);

        assert_eq!(
            mapped[0].save_url.as_deref(),
            Some("https://clinic.example/api/file/upload")
        );
        assert_eq!(mapped[0].remove_url.as_deref(), Some("https://cdn.example/remove"));
    }

    #[test]
    fn parse_utc_variants() {
        assert!(parse_utc("2024-01-01").is_some());
        assert!(parse_utc("2024-01-01T08:15:00.123").is_some());
        assert!(parse_utc("2024-01-01 08:15:00").is_some());
        assert_eq!(
            parse_utc("2024-01-01T10:00:00+02:00").map(|d| d.to_rfc3339()),
            Some("2024-01-01T08:00:00+00:00".to_string())
        );
        assert!(parse_utc("").is_none());
        assert!(parse_utc("01/02/2024").is_none());
    }
}
