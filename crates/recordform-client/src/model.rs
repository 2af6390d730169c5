//! # Entity DTOs
//!
//! Typed views of records for callers who prefer them to raw JSON.
//!
//! Foreign keys are plain ids. When a projection asks for them, the
//! referenced record arrives in a companion navigation property named
//! `<Field>_<Entity>` carrying its display columns. All columns default
//! so projected (partial) records deserialize.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display columns of a referenced record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default, alias = "Id")]
    pub id: Option<Uuid>,
    #[serde(default, alias = "Name")]
    pub name: Option<String>,
}

/// A patient record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Patient {
    #[serde(alias = "id")]
    pub id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,

    pub code: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub file_number: Option<String>,
    pub national_id_number: Option<String>,

    pub gender: Option<Uuid>,
    #[serde(rename = "Gender_Gender", skip_serializing_if = "Option::is_none")]
    pub gender_ref: Option<NamedRef>,

    pub title: Option<Uuid>,
    #[serde(rename = "Title_Title", skip_serializing_if = "Option::is_none")]
    pub title_ref: Option<NamedRef>,

    pub dob: Option<NaiveDateTime>,
    #[serde(rename = "DOBIsApproximate")]
    pub dob_is_approximate: Option<bool>,
    pub age: Option<i32>,
    pub age_unit: Option<Uuid>,
    #[serde(rename = "AgeUnit_AgeUnit", skip_serializing_if = "Option::is_none")]
    pub age_unit_ref: Option<NamedRef>,

    pub mobile: Option<String>,
    pub mobile_number_country_code: Option<i32>,
    pub alternate_mobile: Option<String>,
    pub alternate_number_country_code: Option<i32>,
    pub landline: Option<String>,
    pub email: Option<String>,
    pub blood_group: Option<String>,

    pub location_id: Option<Uuid>,
    #[serde(rename = "LocationId_Location", skip_serializing_if = "Option::is_none")]
    pub location: Option<NamedRef>,

    pub membership_id: Option<Uuid>,
    #[serde(rename = "MembershipId_Membership", skip_serializing_if = "Option::is_none")]
    pub membership: Option<NamedRef>,

    pub referred_by: Option<String>,
    pub referred_by_id: Option<Uuid>,
    #[serde(rename = "ReferredById_Contact", skip_serializing_if = "Option::is_none")]
    pub referred_by_contact: Option<NamedRef>,

    pub patient_address_id: Option<Uuid>,
    #[serde(rename = "PatientAddressId_Address", skip_serializing_if = "Option::is_none")]
    pub patient_address: Option<NamedRef>,

    pub next_of_kin_name: Option<String>,
    pub next_of_kin_mobile: Option<String>,

    pub is_vip: Option<bool>,
    pub is_confidential: Option<bool>,
    pub import: Option<bool>,
    pub patient_enrollment: Option<bool>,
    pub enrollment_date: Option<NaiveDateTime>,
    pub registered_on: Option<NaiveDateTime>,
    pub last_visit_date: Option<NaiveDateTime>,
    pub date_of_death: Option<NaiveDateTime>,
    pub reason_of_death: Option<String>,
    pub prescription: Option<String>,
    pub active: Option<Uuid>,

    pub created_by: Option<Uuid>,
    pub created_on: Option<NaiveDateTime>,
    pub updated_by: Option<Uuid>,
    pub updated_on: Option<NaiveDateTime>,
}

impl Patient {
    /// "First Middle Last", skipping missing parts, or the stored name.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            self.name.clone()
        } else {
            Some(parts.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn projected_patient_deserializes() {
        let patient: Patient = serde_json::from_value(json!({
            "Id": "0b6f6c1e-3f0e-4c38-9a0c-2b8d6f0a1e11",
            "FirstName": "Ada",
            "LastName": "Lovelace",
            "Dob": "1815-12-10T00:00:00",
            "LocationId": "9d3c1f9e-52b4-4a83-8d8e-0b9f3a1c2d44",
            "LocationId_Location": {"id": "9d3c1f9e-52b4-4a83-8d8e-0b9f3a1c2d44", "name": "Ward 4"}
        }))
        .unwrap();

        assert_eq!(patient.first_name.as_deref(), Some("Ada"));
        assert_eq!(patient.location.as_ref().and_then(|l| l.name.as_deref()), Some("Ward 4"));
        assert_eq!(patient.display_name().as_deref(), Some("Ada Lovelace"));
        assert!(patient.dob.is_some());
        assert!(patient.gender.is_none());
    }

    #[test]
    fn navigation_refs_are_skipped_when_absent() {
        let json = serde_json::to_value(Patient::default()).unwrap();
        assert!(json.get("Gender_Gender").is_none());
        assert!(json.get("FirstName").is_some());
    }
}
