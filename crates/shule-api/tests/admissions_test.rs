//! Admission workflow: transitions, the submission stamp, enrollment, and
//! the public application flow.

mod helpers;

use axum::http::StatusCode;
use helpers::{api_path, auth, fixtures, setup_test_app};
use serde_json::{json, Value};

#[tokio::test]
async fn test_happy_path_ends_in_enrollment() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;
    fixtures::accept_application(&app, &token, application_id).await;

    let response = app
        .client()
        .post(&api_path(&format!("/applications/{}/enroll", application_id)))
        .authorization_bearer(&token)
        .json(&json!({}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let outcome = response.json::<Value>();
    assert_eq!(outcome["created"].as_bool(), Some(true));
    let student_id = fixtures::uuid_field(&outcome, "student_id");
    let admission_number = outcome["admission_number"].as_str().unwrap().to_string();

    // The application now carries the terminal status and the student link.
    let response = app
        .client()
        .get(&api_path(&format!("/applications/{}", application_id)))
        .authorization_bearer(&token)
        .await;
    let application = response.json::<Value>();
    assert_eq!(application["status"].as_str(), Some("ENROLLED"));
    assert_eq!(
        application["student_id"].as_str(),
        Some(student_id.to_string().as_str())
    );
    assert_eq!(
        application["admission_number"].as_str(),
        Some(admission_number.as_str())
    );

    // The student exists with the same admission number and copied names.
    let response = app
        .client()
        .get(&api_path(&format!("/students/{}", student_id)))
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let student = response.json::<Value>();
    assert_eq!(student["first_name"].as_str(), Some("Wanjiku"));
    assert_eq!(
        student["admission_number"].as_str(),
        Some(admission_number.as_str())
    );
    assert_eq!(student["status"].as_str(), Some("ACTIVE"));
}

#[tokio::test]
async fn test_enroll_is_idempotent() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;
    fixtures::accept_application(&app, &token, application_id).await;

    let first = app
        .client()
        .post(&api_path(&format!("/applications/{}/enroll", application_id)))
        .authorization_bearer(&token)
        .json(&json!({}))
        .await;
    first.assert_status(StatusCode::CREATED);
    let first = first.json::<Value>();

    // Second call returns the same student with 200, not a duplicate.
    let second = app
        .client()
        .post(&api_path(&format!("/applications/{}/enroll", application_id)))
        .authorization_bearer(&token)
        .json(&json!({}))
        .await;
    second.assert_status_ok();
    let second = second.json::<Value>();

    assert_eq!(second["created"].as_bool(), Some(false));
    assert_eq!(second["student_id"], first["student_id"]);
    assert_eq!(second["admission_number"], first["admission_number"]);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(app.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_enroll_requires_accepted_status() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;

    // Still DRAFT: enrollment is a 409 naming the precondition.
    let response = app
        .client()
        .post(&api_path(&format!("/applications/{}/enroll", application_id)))
        .authorization_bearer(&token)
        .json(&json!({}))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body = response.json::<Value>();
    assert_eq!(body["code"].as_str(), Some("INVALID_ENROLLMENT"));
    assert!(body["error"].as_str().unwrap().contains("ACCEPTED"));
}

#[tokio::test]
async fn test_invalid_transitions_are_rejected() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;

    // Skipping a step is a 409.
    let response = app
        .client()
        .post(&api_path(&format!("/applications/{}/transition", application_id)))
        .authorization_bearer(&token)
        .json(&json!({ "target": "OFFERED" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(
        response.json::<Value>()["code"].as_str(),
        Some("INVALID_TRANSITION")
    );

    // The ENROLLED edge belongs to the enroll operation.
    fixtures::accept_application(&app, &token, application_id).await;
    let response = app
        .client()
        .post(&api_path(&format!("/applications/{}/transition", application_id)))
        .authorization_bearer(&token)
        .json(&json!({ "target": "ENROLLED" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Terminal states admit nothing further.
    let rejected = fixtures::create_application(&app, &token, "Juma", "Hassan").await;
    for target in ["SUBMITTED", "UNDER_REVIEW", "TEST_SCHEDULED", "OFFERED", "REJECTED"] {
        fixtures::transition(&app, &token, rejected, target).await;
    }
    let response = app
        .client()
        .post(&api_path(&format!("/applications/{}/transition", rejected)))
        .authorization_bearer(&token)
        .json(&json!({ "target": "SUBMITTED" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_submitted_at_is_stamped_once() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;

    let response = app
        .client()
        .get(&api_path(&format!("/applications/{}", application_id)))
        .authorization_bearer(&token)
        .await;
    assert!(response.json::<Value>()["submitted_at"].is_null());

    fixtures::transition(&app, &token, application_id, "SUBMITTED").await;

    let response = app
        .client()
        .get(&api_path(&format!("/applications/{}", application_id)))
        .authorization_bearer(&token)
        .await;
    let stamped = response.json::<Value>()["submitted_at"].clone();
    assert!(stamped.is_string());

    // Later transitions never move the stamp.
    fixtures::transition(&app, &token, application_id, "UNDER_REVIEW").await;
    let response = app
        .client()
        .get(&api_path(&format!("/applications/{}", application_id)))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.json::<Value>()["submitted_at"], stamped);
}

#[tokio::test]
async fn test_public_application_flow() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    // Anyone can look the school up by slug and submit a draft.
    let response = app.client().get(&api_path("/public/schools/kilimani")).await;
    response.assert_status_ok();
    let school = response.json::<Value>();
    assert_eq!(school["name"].as_str(), Some("Kilimani Academy"));
    assert!(school.get("admission_number_format").is_none());

    let response = app
        .client()
        .post(&api_path("/public/schools/kilimani/applications"))
        .json(&json!({ "first_name": "Akinyi", "last_name": "Ouma" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let receipt = response.json::<Value>();
    assert_eq!(receipt["status"].as_str(), Some("DRAFT"));
    let application_id = fixtures::uuid_field(&receipt, "id");

    // The applicant can read the draft back and amend it, still without auth.
    let response = app
        .client()
        .get(&api_path(&format!(
            "/public/schools/kilimani/applications/{}",
            application_id
        )))
        .await;
    response.assert_status_ok();

    let response = app
        .client()
        .patch(&api_path(&format!(
            "/public/schools/kilimani/applications/{}",
            application_id
        )))
        .json(&json!({ "guardian_name": "Mary Ouma" }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["guardian_name"].as_str(),
        Some("Mary Ouma")
    );

    // Once submitted, the public surface stops exposing it.
    fixtures::transition(&app, &token, application_id, "SUBMITTED").await;
    let response = app
        .client()
        .get(&api_path(&format!(
            "/public/schools/kilimani/applications/{}",
            application_id
        )))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    // The staff list now contains the public submission.
    let response = app
        .client()
        .get(&api_path("/applications"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.json::<Vec<Value>>().len(), 1);

    // Unknown slug is a plain 404.
    let response = app.client().get(&api_path("/public/schools/nowhere")).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_application() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let draft = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;
    let response = app
        .client()
        .delete(&api_path(&format!("/applications/{}", draft)))
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = app
        .client()
        .get(&api_path(&format!("/applications/{}", draft)))
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    // An enrolled application is the audit trail behind the student; it
    // cannot be removed.
    let enrolled = fixtures::create_application(&app, &token, "Otieno", "Odhiambo").await;
    fixtures::accept_application(&app, &token, enrolled).await;
    app.client()
        .post(&api_path(&format!("/applications/{}/enroll", enrolled)))
        .authorization_bearer(&token)
        .json(&json!({}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .client()
        .delete(&api_path(&format!("/applications/{}", enrolled)))
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_documents_deduplicate_by_checksum() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;

    let body = json!({
        "file_name": "report-card.pdf",
        "content_type": "application/pdf",
        // "report card" in base64
        "content_base64": "cmVwb3J0IGNhcmQ=",
    });

    let first = app
        .client()
        .post(&api_path(&format!("/applications/{}/documents", application_id)))
        .authorization_bearer(&token)
        .json(&body)
        .await;
    first.assert_status(StatusCode::CREATED);
    let first = first.json::<Value>();

    // Identical content resolves to the existing row even under a new name.
    let second = app
        .client()
        .post(&api_path(&format!("/applications/{}/documents", application_id)))
        .authorization_bearer(&token)
        .json(&json!({
            "file_name": "report-card-copy.pdf",
            "content_base64": "cmVwb3J0IGNhcmQ=",
        }))
        .await;
    second.assert_status(StatusCode::CREATED);
    assert_eq!(second.json::<Value>()["id"], first["id"]);

    let response = app
        .client()
        .get(&api_path(&format!("/applications/{}/documents", application_id)))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.json::<Vec<Value>>().len(), 1);
}

#[tokio::test]
async fn test_checksum_backfill_fills_only_missing() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let root = auth::create_user(app.pool(), "root@example.com", true).await;
    let token = auth::token_for(user);
    let root_token = auth::token_for(root);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;

    // A document row from before hashing existed, with no checksum.
    let document_id: uuid::Uuid = sqlx::query_scalar(
        "INSERT INTO application_documents (application_id, file_name) VALUES ($1, 'legacy.pdf') RETURNING id",
    )
    .bind(application_id)
    .fetch_one(app.pool())
    .await
    .unwrap();

    // Only superusers may run the backfill.
    let path = api_path(&format!(
        "/applications/{}/documents/{}/checksum",
        application_id, document_id
    ));
    let body = json!({ "content_base64": "cmVwb3J0IGNhcmQ=" });

    let response = app
        .client()
        .post(&path)
        .authorization_bearer(&token)
        .json(&body)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = app
        .client()
        .post(&path)
        .authorization_bearer(&root_token)
        .json(&body)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["updated"].as_bool(), Some(true));

    // Second run is a no-op: the checksum is already present.
    let response = app
        .client()
        .post(&path)
        .authorization_bearer(&root_token)
        .json(&body)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["updated"].as_bool(), Some(false));
}
