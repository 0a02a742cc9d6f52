//! API-driven fixtures shared across integration tests.

use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{api_path, TestApp};

pub fn uuid_field(value: &Value, field: &str) -> Uuid {
    value[field]
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("Missing or invalid '{}' in {}", field, value))
}

/// Create a school through the API; the creator becomes owner and member.
pub async fn create_school(app: &TestApp, token: &str, name: &str, slug: &str) -> Uuid {
    let response = app
        .client()
        .post(&api_path("/schools"))
        .authorization_bearer(token)
        .json(&json!({ "name": name, "slug": slug }))
        .await;

    response.assert_status(StatusCode::CREATED);
    uuid_field(&response.json::<Value>(), "id")
}

/// Create a draft application with minimal fields.
pub async fn create_application(
    app: &TestApp,
    token: &str,
    first_name: &str,
    last_name: &str,
) -> Uuid {
    let response = app
        .client()
        .post(&api_path("/applications"))
        .authorization_bearer(token)
        .json(&json!({ "first_name": first_name, "last_name": last_name }))
        .await;

    response.assert_status(StatusCode::CREATED);
    uuid_field(&response.json::<Value>(), "id")
}

/// Move an application to `target`, asserting success.
pub async fn transition(app: &TestApp, token: &str, application_id: Uuid, target: &str) {
    let response = app
        .client()
        .post(&api_path(&format!("/applications/{}/transition", application_id)))
        .authorization_bearer(token)
        .json(&json!({ "target": target }))
        .await;

    response.assert_status_ok();
}

/// Walk an application along the happy path up to ACCEPTED.
pub async fn accept_application(app: &TestApp, token: &str, application_id: Uuid) {
    for target in ["SUBMITTED", "UNDER_REVIEW", "TEST_SCHEDULED", "OFFERED", "ACCEPTED"] {
        transition(app, token, application_id, target).await;
    }
}

/// Set a school's admission-number configuration.
pub async fn set_admission_config(
    app: &TestApp,
    token: &str,
    school_id: Uuid,
    format: &str,
    prefix: &str,
    padding: i16,
) {
    let response = app
        .client()
        .put(&api_path(&format!("/schools/{}/admission-config", school_id)))
        .authorization_bearer(token)
        .json(&json!({
            "admission_number_format": format,
            "admission_prefix": prefix,
            "admission_seq_padding": padding,
        }))
        .await;

    response.assert_status_ok();
}
