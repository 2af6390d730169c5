//! # Form Model
//!
//! The bound state of a rendered form: one flat value per named field,
//! seeded from the mapped layout and edited through [`FormModel::set_value`].
//! Keys are the layout's field names, so nested entity columns appear as
//! dotted keys (`PatientAddressId_Address.Street`).

use crate::CoreError;
use crate::field::{DataType, FieldNode, FieldValue, Record, walk};
use crate::mapping::parse_utc;
use crate::projection::DEFAULT_VALUE_FIELD;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// A reason a form cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{0} is required")]
    Required(String),

    #[error("{0} must be a number")]
    NotNumeric(String),

    #[error("{0} must be a valid identifier")]
    InvalidGuid(String),

    #[error("{0} must be a valid date")]
    InvalidDate(String),

    #[error("{0} is not one of the available options")]
    UnknownOption(String),
}

impl Violation {
    /// The offending field.
    pub fn field(&self) -> &str {
        match self {
            Self::Required(field)
            | Self::NotNumeric(field)
            | Self::InvalidGuid(field)
            | Self::InvalidDate(field)
            | Self::UnknownOption(field) => field,
        }
    }
}

#[derive(Debug, Clone)]
struct BoundField {
    name: String,
    data_type: DataType,
    required: bool,
    value_field: String,
    options: Option<Vec<Value>>,
}

/// Flat, two-way-bound form state.
#[derive(Debug, Clone, Default)]
pub struct FormModel {
    fields: Vec<BoundField>,
    values: Record,
}

impl FormModel {
    /// Bind every named leaf of a mapped layout. The first node wins when
    /// a name repeats.
    pub fn from_layout(layout: &[FieldNode]) -> Self {
        let mut model = Self::default();
        walk(layout, &mut |_, node| {
            if node.is_container() || node.field_name.is_empty() {
                return;
            }
            if model.values.contains_key(&node.field_name) {
                return;
            }
            let value = node.value.as_ref().map(FieldValue::to_json).unwrap_or_default();
            model.values.insert(node.field_name.clone(), value);
            model.fields.push(BoundField {
                name: node.field_name.clone(),
                data_type: node.data_type.clone(),
                required: node.required,
                value_field: node
                    .value_field
                    .clone()
                    .unwrap_or_else(|| DEFAULT_VALUE_FIELD.to_string()),
                options: node.data_source.clone(),
            });
        });
        model
    }

    /// Current values, keyed by field name.
    pub fn value(&self) -> &Record {
        &self.values
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Field names in layout order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn set_value(&mut self, field: &str, value: Value) -> Result<(), CoreError> {
        match self.values.get_mut(field) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(CoreError::UnknownField(field.to_string())),
        }
    }

    /// Bind several values at once. Stops at the first unknown field.
    pub fn apply(&mut self, values: &Record) -> Result<(), CoreError> {
        for (field, value) in values {
            self.set_value(field, value.clone())?;
        }
        Ok(())
    }

    /// Every violation in the current values, in layout order.
    pub fn validate(&self) -> Vec<Violation> {
        self.fields
            .iter()
            .filter_map(|field| {
                let value = self.values.get(&field.name).unwrap_or(&Value::Null);
                check(field, value)
            })
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

fn check(field: &BoundField, value: &Value) -> Option<Violation> {
    if is_blank(value) {
        return field.required.then(|| Violation::Required(field.name.clone()));
    }

    match field.data_type {
        DataType::Numeric => {
            let numeric = match value {
                Value::Number(_) => true,
                Value::String(s) => s.trim().parse::<f64>().is_ok(),
                _ => false,
            };
            (!numeric).then(|| Violation::NotNumeric(field.name.clone()))
        }
        DataType::Guid => {
            let Some(id) = value.as_str().filter(|s| Uuid::parse_str(s).is_ok()) else {
                return Some(Violation::InvalidGuid(field.name.clone()));
            };
            match &field.options {
                Some(options) if !options.is_empty() => {
                    let listed = options.iter().any(|option| {
                        option
                            .get(&field.value_field)
                            .and_then(Value::as_str)
                            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(id))
                    });
                    (!listed).then(|| Violation::UnknownOption(field.name.clone()))
                }
                _ => None,
            }
        }
        DataType::Date | DataType::DateTime => {
            let parsed = value.as_str().and_then(parse_utc).is_some();
            (!parsed).then(|| Violation::InvalidDate(field.name.clone()))
        }
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// =============================================================================
// TESTS
// =============================================================================
