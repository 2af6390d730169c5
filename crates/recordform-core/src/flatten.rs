//! # Flatten / Unflatten
//!
//! Conversion between nested records and the dotted-key model the form
//! binds to.
//!
//! Flattening is one level deep and additive: the nested object stays in
//! place and each of its members is copied to a `parent.child` key.
//! Unflattening rebuilds nested objects from dotted keys and stamps every
//! newly introduced nested entity with the tenant and an identifier.

use crate::field::Record;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Tenant column stamped on nested entities.
pub const TENANT_ID_KEY: &str = "TenantId";

/// Primary key column of nested entities.
pub const ID_KEY: &str = "Id";

/// Where nested entities get their `Id` from when unflattening.
#[derive(Debug, Clone, Copy)]
pub enum NestedIds<'a> {
    /// New record: every nested entity gets a fresh UUID.
    Fresh,
    /// Edited record: the id is read from the flattened original under
    /// the key prefix before the first `_` (`PatientAddressId` for
    /// `PatientAddressId_Address.Street`).
    Existing(&'a Record),
}

/// Copy the members of every nested object (or array) to dotted keys.
pub fn flatten_object(record: &Record) -> Record {
    let mut result = record.clone();

    for (key, value) in record {
        match value {
            Value::Object(nested) => {
                for (nested_key, nested_value) in nested {
                    result.insert(format!("{}.{}", key, nested_key), nested_value.clone());
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    result.insert(format!("{}.{}", key, index), item.clone());
                }
            }
            _ => {}
        }
    }

    result
}

/// Rebuild nested objects from dotted keys.
pub fn unflatten_object(flat: &Record, tenant_id: &str, ids: NestedIds<'_>) -> Record {
    let mut result = Record::new();

    for (key, value) in flat {
        let parts: Vec<&str> = key.split('.').collect();

        if let [root, _, ..] = parts.as_slice() {
            if result.get(*root).is_none_or(Value::is_null) {
                result.insert((*root).to_string(), Value::Object(nested_stub(root, tenant_id, ids)));
            }
        }

        insert_path(&mut result, &parts, value.clone());
    }

    result
}

fn nested_stub(root: &str, tenant_id: &str, ids: NestedIds<'_>) -> Map<String, Value> {
    let mut stub = Map::new();
    stub.insert(TENANT_ID_KEY.to_string(), Value::String(tenant_id.to_string()));

    let id = match ids {
        NestedIds::Fresh => Some(Value::String(Uuid::new_v4().to_string())),
        NestedIds::Existing(record) => {
            let id_key = root.split('_').next().unwrap_or(root);
            record.get(id_key).cloned()
        }
    };
    if let Some(id) = id {
        stub.insert(ID_KEY.to_string(), id);
    }

    stub
}

// Intermediate scalars are left alone; the value is dropped.
fn insert_path(target: &mut Map<String, Value>, parts: &[&str], value: Value) {
    match parts {
        [] => {}
        [last] => {
            target.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let slot = target
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if slot.is_null() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                insert_path(child, rest, value);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
