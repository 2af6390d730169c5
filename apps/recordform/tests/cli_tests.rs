//! Integration tests for recordform CLI commands.
//!
//! Uses tempfile for layout directories and value files, and wiremock
//! for the records API.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use recordform::cli::{
    CliError, cmd_delete, cmd_fields, cmd_list, cmd_show, cmd_submit, read_values,
};
use recordform::config::{AppConfig, LayoutSourceConfig};
use recordform::teardown::Teardown;
use recordform_client::ListQuery;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write `patient/Add.json` and `patient/Edit.json` layouts.
fn create_layouts(dir: &TempDir) -> PathBuf {
    let root = dir.path().join("layouts");
    let patient = root.join("patient");
    std::fs::create_dir_all(&patient).unwrap();
    let layout = r#"[
        {"dataType": "section", "label": "Patient", "fields": [
            {"fieldName": "FirstName", "dataType": "string", "required": true},
            {"fieldName": "Dob", "dataType": "date"},
            {"fieldName": "Gender", "dataType": "guid", "entityName": "Gender"}
        ]}
    ]"#;
    std::fs::write(patient.join("Add.json"), layout).unwrap();
    std::fs::write(patient.join("Edit.json"), layout).unwrap();
    root
}

fn config(server: &MockServer, layouts: PathBuf) -> AppConfig {
    AppConfig {
        api_url: server.uri(),
        tenant_id: String::new(),
        layout_source: LayoutSourceConfig::Directory(layouts),
        timeout: Duration::from_secs(5),
    }
}

async fn mount_genders(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/Gender"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "6a1e3c2b-0d4f-4e5a-9b8c-7d6e5f4a3b21", "name": "Female"}
        ])))
        .mount(server)
        .await;
}

// =============================================================================
// FIELDS COMMAND TESTS
// =============================================================================

#[tokio::test]
async fn test_fields_lists_projection() {
    let temp = create_temp_dir();
    let server = MockServer::start().await;
    let config = config(&server, create_layouts(&temp));

    let output = cmd_fields(&config, "patient", "Edit").await.unwrap();

    assert_eq!(output, "FirstName\nDob\nGender\nGender_Gender.id\nGender_Gender.name");
}

#[tokio::test]
async fn test_bundled_layouts_parse() {
    let server = MockServer::start().await;
    let layouts = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../layouts");
    let config = config(&server, layouts);

    let output = cmd_fields(&config, "patient", "Add").await.unwrap();
    assert!(output.contains("PatientAddressId_Address.Street"));

    let output = cmd_fields(&config, "Contact", "ContactCard").await.unwrap();
    assert_eq!(output, "Name\nMobile\nEmail");
}

#[tokio::test]
async fn test_fields_missing_layout_fails() {
    let temp = create_temp_dir();
    let server = MockServer::start().await;
    let config = config(&server, create_layouts(&temp));

    let result = cmd_fields(&config, "visit", "Edit").await;
    assert!(matches!(result, Err(CliError::Client(_))));
}

// =============================================================================
// SHOW COMMAND TESTS
// =============================================================================

#[tokio::test]
async fn test_show_renders_edit_form() {
    let temp = create_temp_dir();
    let server = MockServer::start().await;
    mount_genders(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/patient/123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "FirstName": "Ada",
            "Dob": "1990-05-01T00:00:00Z"
        })))
        .mount(&server)
        .await;
    let config = config(&server, create_layouts(&temp));

    let output = cmd_show(&config, &Teardown::new(), "patient", Some("123"), false, false)
        .await
        .unwrap();

    assert!(output.starts_with("[section] Patient\n"));
    assert!(output.contains("  First Name: Ada\n"));
    assert!(output.contains("  Dob: 05/01/1990\n"));
    assert!(output.contains("  Gender:  (1 options)\n"));
}

#[tokio::test]
async fn test_show_json_is_layout() {
    let temp = create_temp_dir();
    let server = MockServer::start().await;
    mount_genders(&server).await;
    let config = config(&server, create_layouts(&temp));

    let output = cmd_show(&config, &Teardown::new(), "patient", None, false, true)
        .await
        .unwrap();
    let layout: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(layout[0]["fields"][0]["fieldName"], "FirstName");
    assert_eq!(layout[0]["fields"][2]["dataSource"][0]["name"], "Female");
}

#[tokio::test]
async fn test_show_after_teardown_is_cancelled() {
    let temp = create_temp_dir();
    let server = MockServer::start().await;
    let config = config(&server, create_layouts(&temp));
    let teardown = Teardown::new();
    teardown.fire();

    let result = cmd_show(&config, &teardown, "patient", None, false, false).await;

    assert!(matches!(
        result,
        Err(CliError::Form(recordform::controller::FormError::Cancelled))
    ));
}

// =============================================================================
// SUBMIT COMMAND TESTS
// =============================================================================

#[tokio::test]
async fn test_submit_adds_record() {
    let temp = create_temp_dir();
    let server = MockServer::start().await;
    mount_genders(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/patient"))
        .and(body_json(json!({"FirstName": "Ada", "Dob": "", "Gender": ""})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"Id": "p1"})))
        .expect(1)
        .mount(&server)
        .await;
    let config = config(&server, create_layouts(&temp));
    let values = temp.path().join("values.json");
    std::fs::write(&values, r#"{"FirstName": "Ada"}"#).unwrap();

    let output = cmd_submit(&config, &Teardown::new(), "patient", None, &values)
        .await
        .unwrap();

    assert!(output.contains("\"Id\": \"p1\""));
}

#[tokio::test]
async fn test_submit_reports_violations() {
    let temp = create_temp_dir();
    let server = MockServer::start().await;
    mount_genders(&server).await;
    let config = config(&server, create_layouts(&temp));
    let values = temp.path().join("values.json");
    std::fs::write(&values, r#"{"Dob": "yesterday"}"#).unwrap();

    let err = cmd_submit(&config, &Teardown::new(), "patient", None, &values)
        .await
        .unwrap_err();

    match err {
        CliError::Invalid(message) => {
            assert_eq!(message, "FirstName is required\nDob must be a valid date");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_submit_unknown_field_fails() {
    let temp = create_temp_dir();
    let server = MockServer::start().await;
    mount_genders(&server).await;
    let config = config(&server, create_layouts(&temp));
    let values = temp.path().join("values.json");
    std::fs::write(&values, r#"{"Nickname": "Ada"}"#).unwrap();

    let result = cmd_submit(&config, &Teardown::new(), "patient", None, &values).await;
    assert!(matches!(result, Err(CliError::Form(_))));
}

#[test]
fn test_read_values_requires_object() {
    let temp = create_temp_dir();
    let values = temp.path().join("values.json");
    std::fs::write(&values, "[1, 2]").unwrap();

    assert!(matches!(read_values(&values), Err(CliError::Invalid(_))));
    assert!(matches!(
        read_values(&temp.path().join("missing.json")),
        Err(CliError::Io { .. })
    ));
}

// =============================================================================
// LIST / DELETE COMMAND TESTS
// =============================================================================

#[tokio::test]
async fn test_list_forwards_query() {
    let temp = create_temp_dir();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/patient"))
        .and(query_param("searchTerm", "ada"))
        .and(query_param("pageNumber", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"FirstName": "Ada"}])))
        .expect(1)
        .mount(&server)
        .await;
    let config = config(&server, create_layouts(&temp));

    let query = ListQuery::default().search("ada").page(2, 10);
    let output = cmd_list(&config, "patient", &query).await.unwrap();

    assert!(output.contains("\"FirstName\": \"Ada\""));
}

#[tokio::test]
async fn test_delete_record() {
    let temp = create_temp_dir();
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/patient/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
        .expect(1)
        .mount(&server)
        .await;
    let config = config(&server, create_layouts(&temp));

    let output = cmd_delete(&config, "patient", "9").await.unwrap();
    assert_eq!(output, "true");
}
