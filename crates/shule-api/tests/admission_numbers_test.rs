//! Admission-number assignment: sequencing, format variants, seeding from
//! pre-existing numbers, and duplicate handling.

mod helpers;

use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use helpers::{api_path, auth, fixtures, setup_test_app};
use serde_json::{json, Value};
use uuid::Uuid;

async fn assign(app: &helpers::TestApp, token: &str, application_id: Uuid) -> Value {
    let response = app
        .client()
        .post(&api_path(&format!(
            "/applications/{}/admission-number",
            application_id
        )))
        .authorization_bearer(token)
        .json(&json!({}))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

#[tokio::test]
async fn test_year_seq_numbers_are_sequential() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let year = Utc::now().year();
    let first = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;
    let second = fixtures::create_application(&app, &token, "Otieno", "Odhiambo").await;

    let assigned = assign(&app, &token, first).await;
    assert_eq!(
        assigned["admission_number"].as_str(),
        Some(format!("{}-0001", year).as_str())
    );

    let assigned = assign(&app, &token, second).await;
    assert_eq!(
        assigned["admission_number"].as_str(),
        Some(format!("{}-0002", year).as_str())
    );
}

#[tokio::test]
async fn test_assignment_is_idempotent() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;

    let first = assign(&app, &token, application_id).await;
    let second = assign(&app, &token, application_id).await;
    assert_eq!(second["admission_number"], first["admission_number"]);

    // The counter did not advance for the repeat call.
    let next = fixtures::create_application(&app, &token, "Otieno", "Odhiambo").await;
    let assigned = assign(&app, &token, next).await;
    assert_eq!(
        assigned["admission_number"].as_str(),
        Some(format!("{}-0002", Utc::now().year()).as_str())
    );
}

#[tokio::test]
async fn test_prefix_year_seq_uses_configured_prefix() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    let school = fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;
    fixtures::set_admission_config(&app, &token, school, "PREFIX_YEAR_SEQ", "KCB-", 4).await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;
    let assigned = assign(&app, &token, application_id).await;
    assert_eq!(
        assigned["admission_number"].as_str(),
        Some(format!("KCB-{}-0001", Utc::now().year()).as_str())
    );
}

#[tokio::test]
async fn test_generator_seeds_past_hand_entered_numbers() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let year = Utc::now().year();

    // A clerk hand-entered a number deep into the series.
    let existing = fixtures::create_application(&app, &token, "Njeri", "Mwangi").await;
    let response = app
        .client()
        .post(&api_path(&format!("/applications/{}/admission-number", existing)))
        .authorization_bearer(&token)
        .json(&json!({ "custom_number": format!("{}-0042", year) }))
        .await;
    response.assert_status_ok();

    // The generator continues after the highest existing number, never below.
    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;
    let assigned = assign(&app, &token, application_id).await;
    assert_eq!(
        assigned["admission_number"].as_str(),
        Some(format!("{}-0043", year).as_str())
    );
}

#[tokio::test]
async fn test_custom_format_never_auto_assigns() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    let school = fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;
    fixtures::set_admission_config(&app, &token, school, "CUSTOM", "", 4).await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;

    // No custom number given: nothing is assigned.
    let assigned = assign(&app, &token, application_id).await;
    assert!(assigned["admission_number"].is_null());

    // An explicit number sticks.
    let response = app
        .client()
        .post(&api_path(&format!(
            "/applications/{}/admission-number",
            application_id
        )))
        .authorization_bearer(&token)
        .json(&json!({ "custom_number": "LEGACY-0007" }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["admission_number"].as_str(),
        Some("LEGACY-0007")
    );
}

#[tokio::test]
async fn test_assigned_numbers_are_never_reassigned() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    let school = fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;
    fixtures::set_admission_config(&app, &token, school, "CUSTOM", "", 4).await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;

    let response = app
        .client()
        .post(&api_path(&format!(
            "/applications/{}/admission-number",
            application_id
        )))
        .authorization_bearer(&token)
        .json(&json!({ "custom_number": "LEGACY-0007" }))
        .await;
    response.assert_status_ok();

    // Changing an assigned number is rejected.
    let response = app
        .client()
        .post(&api_path(&format!(
            "/applications/{}/admission-number",
            application_id
        )))
        .authorization_bearer(&token)
        .json(&json!({ "custom_number": "LEGACY-0008" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Re-sending the same value is a no-op.
    let response = app
        .client()
        .post(&api_path(&format!(
            "/applications/{}/admission-number",
            application_id
        )))
        .authorization_bearer(&token)
        .json(&json!({ "custom_number": "LEGACY-0007" }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["admission_number"].as_str(),
        Some("LEGACY-0007")
    );
}

#[tokio::test]
async fn test_number_year_follows_submission_year() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;
    fixtures::transition(&app, &token, application_id, "SUBMITTED").await;

    // An application submitted in a past year stays in that year's series.
    sqlx::query("UPDATE applications SET submitted_at = '2020-05-01T09:00:00Z' WHERE id = $1")
        .bind(application_id)
        .execute(app.pool())
        .await
        .expect("Failed to backdate submission");

    let assigned = assign(&app, &token, application_id).await;
    assert_eq!(assigned["admission_number"].as_str(), Some("2020-0001"));
}

#[tokio::test]
async fn test_prefix_metacharacters_do_not_skew_seeding() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    let school = fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let year = Utc::now().year();

    // A hand-entered number whose prefix would match "S_-" as a pattern.
    let existing = fixtures::create_application(&app, &token, "Njeri", "Mwangi").await;
    let response = app
        .client()
        .post(&api_path(&format!("/applications/{}/admission-number", existing)))
        .authorization_bearer(&token)
        .json(&json!({ "custom_number": format!("SX-{}-0042", year) }))
        .await;
    response.assert_status_ok();

    // The underscore in the prefix is literal; the series starts at 1.
    fixtures::set_admission_config(&app, &token, school, "PREFIX_YEAR_SEQ", "S_-", 4).await;
    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;
    let assigned = assign(&app, &token, application_id).await;
    assert_eq!(
        assigned["admission_number"].as_str(),
        Some(format!("S_-{}-0001", year).as_str())
    );
}

#[tokio::test]
async fn test_duplicate_custom_number_is_rejected() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let first = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;
    let second = fixtures::create_application(&app, &token, "Otieno", "Odhiambo").await;

    let response = app
        .client()
        .post(&api_path(&format!("/applications/{}/admission-number", first)))
        .authorization_bearer(&token)
        .json(&json!({ "custom_number": "LEGACY-0001" }))
        .await;
    response.assert_status_ok();

    let response = app
        .client()
        .post(&api_path(&format!("/applications/{}/admission-number", second)))
        .authorization_bearer(&token)
        .json(&json!({ "custom_number": "LEGACY-0001" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sequences_are_independent_per_school() {
    let app = setup_test_app().await;

    let alice = auth::create_user(app.pool(), "alice@example.com", false).await;
    let bob = auth::create_user(app.pool(), "bob@example.com", false).await;
    let alice_token = auth::token_for(alice);
    let bob_token = auth::token_for(bob);

    fixtures::create_school(&app, &alice_token, "Kilimani Academy", "kilimani").await;
    fixtures::create_school(&app, &bob_token, "Baraka School", "baraka").await;

    let year = Utc::now().year();

    let a = fixtures::create_application(&app, &alice_token, "Wanjiku", "Kamau").await;
    let assigned = assign(&app, &alice_token, a).await;
    assert_eq!(
        assigned["admission_number"].as_str(),
        Some(format!("{}-0001", year).as_str())
    );

    // Bob's school starts its own series at 1.
    let b = fixtures::create_application(&app, &bob_token, "Akinyi", "Ouma").await;
    let assigned = assign(&app, &bob_token, b).await;
    assert_eq!(
        assigned["admission_number"].as_str(),
        Some(format!("{}-0001", year).as_str())
    );
}
