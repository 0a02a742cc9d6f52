//! Races on the admission pipeline: concurrent enrollment must produce one
//! student, and concurrent number assignment must never hand out duplicates.

mod helpers;

use helpers::{api_path, auth, fixtures, setup_test_app};
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn test_concurrent_enrollment_creates_one_student() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let application_id = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;
    fixtures::accept_application(&app, &token, application_id).await;

    let path = api_path(&format!("/applications/{}/enroll", application_id));
    let (first, second) = tokio::join!(
        app.client()
            .post(&path)
            .authorization_bearer(&token)
            .json(&json!({})),
        app.client()
            .post(&path)
            .authorization_bearer(&token)
            .json(&json!({})),
    );

    assert!(first.status_code().is_success(), "{}", first.text());
    assert!(second.status_code().is_success(), "{}", second.text());

    let first = first.json::<Value>();
    let second = second.json::<Value>();

    // Both callers see the same student; exactly one created it.
    assert_eq!(first["student_id"], second["student_id"]);
    assert_eq!(first["admission_number"], second["admission_number"]);
    assert_ne!(
        first["created"].as_bool(),
        second["created"].as_bool(),
        "exactly one call should create the student"
    );

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE application_id = $1")
        .bind(application_id)
        .fetch_one(app.pool())
        .await
        .expect("Failed to count students");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_concurrent_assignment_yields_distinct_numbers() {
    let app = setup_test_app().await;

    let user = auth::create_user(app.pool(), "admin@school.test", false).await;
    let token = auth::token_for(user);
    fixtures::create_school(&app, &token, "Kilimani Academy", "kilimani").await;

    let first_app = fixtures::create_application(&app, &token, "Wanjiku", "Kamau").await;
    let second_app = fixtures::create_application(&app, &token, "Otieno", "Odhiambo").await;

    let assign_path = |id: Uuid| api_path(&format!("/applications/{}/admission-number", id));
    let (first, second) = tokio::join!(
        app.client()
            .post(&assign_path(first_app))
            .authorization_bearer(&token)
            .json(&json!({})),
        app.client()
            .post(&assign_path(second_app))
            .authorization_bearer(&token)
            .json(&json!({})),
    );

    first.assert_status_ok();
    second.assert_status_ok();

    let first = first.json::<Value>()["admission_number"]
        .as_str()
        .expect("missing number")
        .to_string();
    let second = second.json::<Value>()["admission_number"]
        .as_str()
        .expect("missing number")
        .to_string();

    assert_ne!(first, second);

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT admission_number) FROM applications WHERE admission_number IS NOT NULL",
    )
    .fetch_one(app.pool())
    .await
    .expect("Failed to count numbers");
    assert_eq!(count, 2);
}
