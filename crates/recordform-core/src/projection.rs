//! # Record Projection
//!
//! Computes the minimal column list a layout needs from the server.
//!
//! For a foreign key the server is also asked for the referenced record's
//! display columns via the companion navigation property
//! `<fieldName>_<entityName>`.

use crate::field::{DataType, FieldNode};

/// Value column requested for a referenced record when the node names none.
pub const DEFAULT_VALUE_FIELD: &str = "id";

/// Text column requested for a referenced record when the node names none.
pub const DEFAULT_TEXT_FIELD: &str = "name";

/// Name of the navigation property carrying a foreign key's record.
pub fn companion_key(field_name: &str, entity_name: &str) -> String {
    format!("{}_{}", field_name, entity_name)
}

/// Collect the field paths a layout binds, in layout order.
pub fn get_fields(layout: &[FieldNode]) -> Vec<String> {
    let mut fields = Vec::new();
    get_fields_into(layout, &mut fields);
    fields
}

/// Append the field paths of `layout` to `fields`, skipping names already present.
pub fn get_fields_into(layout: &[FieldNode], fields: &mut Vec<String>) {
    for node in layout {
        if node.is_container() {
            get_fields_into(&node.fields, fields);
            continue;
        }
        if node.field_name.is_empty() || fields.contains(&node.field_name) {
            continue;
        }

        fields.push(node.field_name.clone());

        if let (DataType::Guid, Some(entity)) = (&node.data_type, node.entity()) {
            let companion = companion_key(&node.field_name, entity);
            let value_field = node.value_field.as_deref().unwrap_or(DEFAULT_VALUE_FIELD);
            let text_field = node.text_field.as_deref().unwrap_or(DEFAULT_TEXT_FIELD);
            fields.push(format!("{}.{}", companion, value_field));
            fields.push(format!("{}.{}", companion, text_field));
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn patient_layout() -> Vec<FieldNode> {
        vec![
            FieldNode::container(
                DataType::Section,
                vec![
                    FieldNode::leaf("FirstName", DataType::String),
                    FieldNode::leaf("Dob", DataType::Date),
                ],
            ),
            FieldNode::container(
                DataType::Tab,
                vec![FieldNode::container(
                    DataType::GroupField,
                    vec![FieldNode::leaf("LocationId", DataType::Guid).with_entity("Location")],
                )],
            ),
        ]
    }

    #[test]
    fn guid_field_requests_companion_columns() {
        let fields = get_fields(&patient_layout());
        assert_eq!(
            fields,
            vec![
                "FirstName",
                "Dob",
                "LocationId",
                "LocationId_Location.id",
                "LocationId_Location.name",
            ]
        );
    }

    #[test]
    fn custom_value_and_text_fields() {
        let layout = vec![
            FieldNode::leaf("Gender", DataType::Guid)
                .with_entity("Gender")
                .with_value_field("code")
                .with_text_field("label"),
        ];
        assert_eq!(
            get_fields(&layout),
            vec!["Gender", "Gender_Gender.code", "Gender_Gender.label"]
        );
    }

    #[test]
    fn guid_without_entity_has_no_companion() {
        let layout = vec![FieldNode::leaf("ParentId", DataType::Guid)];
        assert_eq!(get_fields(&layout), vec!["ParentId"]);
    }

    #[test]
    fn duplicates_and_unnamed_nodes_are_skipped() {
        let layout = vec![
            FieldNode::leaf("Email", DataType::String),
            FieldNode::leaf("", DataType::String),
            FieldNode::container(
                DataType::Section,
                vec![FieldNode::leaf("Email", DataType::String)],
            ),
        ];
        assert_eq!(get_fields(&layout), vec!["Email"]);
    }

    #[test]
    fn appends_to_existing_accumulator() {
        let mut fields = vec!["Id".to_string()];
        get_fields_into(&[FieldNode::leaf("Code", DataType::String)], &mut fields);
        assert_eq!(fields, vec!["Id", "Code"]);
    }
}
