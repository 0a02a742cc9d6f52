//! Tenant isolation: data from one school is never visible through another
//! school's context, and tenant resolution follows the documented precedence.

mod helpers;

use axum::http::StatusCode;
use helpers::{api_path, auth, fixtures, setup_test_app};
use serde_json::{json, Value};

#[tokio::test]
async fn test_applications_are_isolated_between_schools() {
    let app = setup_test_app().await;

    let alice = auth::create_user(app.pool(), "alice@example.com", false).await;
    let bob = auth::create_user(app.pool(), "bob@example.com", false).await;
    let alice_token = auth::token_for(alice);
    let bob_token = auth::token_for(bob);

    fixtures::create_school(&app, &alice_token, "Kilimani Academy", "kilimani").await;
    fixtures::create_school(&app, &bob_token, "Baraka School", "baraka").await;

    let application_id =
        fixtures::create_application(&app, &alice_token, "Wanjiku", "Kamau").await;

    // Bob's list is scoped to his school and must not contain Alice's data.
    let response = app
        .client()
        .get(&api_path("/applications"))
        .authorization_bearer(&bob_token)
        .await;
    response.assert_status_ok();
    let listed = response.json::<Vec<Value>>();
    assert!(listed.is_empty(), "Expected no applications, got {:?}", listed);

    // Direct fetch across tenants is a 404, not a 403: existence is hidden.
    let response = app
        .client()
        .get(&api_path(&format!("/applications/{}", application_id)))
        .authorization_bearer(&bob_token)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    // Alice still sees her own application.
    let response = app
        .client()
        .get(&api_path(&format!("/applications/{}", application_id)))
        .authorization_bearer(&alice_token)
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_school_hint_requires_membership() {
    let app = setup_test_app().await;

    let alice = auth::create_user(app.pool(), "alice@example.com", false).await;
    let bob = auth::create_user(app.pool(), "bob@example.com", false).await;
    let alice_token = auth::token_for(alice);
    let bob_token = auth::token_for(bob);

    let alice_school =
        fixtures::create_school(&app, &alice_token, "Kilimani Academy", "kilimani").await;
    fixtures::create_school(&app, &bob_token, "Baraka School", "baraka").await;

    // Bob names Alice's school explicitly: denied.
    let response = app
        .client()
        .post(&api_path("/applications"))
        .authorization_bearer(&bob_token)
        .add_header("x-school-id", alice_school.to_string())
        .json(&json!({ "first_name": "Otieno", "last_name": "Odhiambo" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // A malformed hint is a 400 before any tenant logic runs.
    let response = app
        .client()
        .get(&api_path("/applications"))
        .authorization_bearer(&bob_token)
        .add_header("x-school-id", "not-a-uuid")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_multi_membership_needs_hint_for_writes() {
    let app = setup_test_app().await;

    let carol = auth::create_user(app.pool(), "carol@example.com", false).await;
    let carol_token = auth::token_for(carol);

    let first = fixtures::create_school(&app, &carol_token, "First School", "first").await;
    let _second = fixtures::create_school(&app, &carol_token, "Second School", "second").await;

    // Two memberships and no hint: writes are rejected with 400.
    let response = app
        .client()
        .post(&api_path("/applications"))
        .authorization_bearer(&carol_token)
        .json(&json!({ "first_name": "Njeri", "last_name": "Mwangi" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // Reads degrade to an empty result set rather than failing.
    let response = app
        .client()
        .get(&api_path("/applications"))
        .authorization_bearer(&carol_token)
        .await;
    response.assert_status_ok();
    assert!(response.json::<Vec<Value>>().is_empty());

    // With a hint, the write goes through against the named school.
    let response = app
        .client()
        .post(&api_path("/applications"))
        .authorization_bearer(&carol_token)
        .add_header("x-school-id", first.to_string())
        .json(&json!({ "first_name": "Njeri", "last_name": "Mwangi" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created = response.json::<Value>();
    assert_eq!(created["school_id"].as_str(), Some(first.to_string().as_str()));
}

#[tokio::test]
async fn test_superuser_reads_unscoped_but_cannot_write_without_hint() {
    let app = setup_test_app().await;

    let alice = auth::create_user(app.pool(), "alice@example.com", false).await;
    let root = auth::create_user(app.pool(), "root@example.com", true).await;
    let alice_token = auth::token_for(alice);
    let root_token = auth::token_for(root);

    let school = fixtures::create_school(&app, &alice_token, "Kilimani Academy", "kilimani").await;
    fixtures::create_application(&app, &alice_token, "Wanjiku", "Kamau").await;

    // Unscoped superuser read sees everything.
    let response = app
        .client()
        .get(&api_path("/applications"))
        .authorization_bearer(&root_token)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Vec<Value>>().len(), 1);

    // Writes still require a pinned school.
    let response = app
        .client()
        .post(&api_path("/applications"))
        .authorization_bearer(&root_token)
        .json(&json!({ "first_name": "Admin", "last_name": "Entry" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    // With a hint the superuser may write into any school.
    let response = app
        .client()
        .post(&api_path("/applications"))
        .authorization_bearer(&root_token)
        .add_header("x-school-id", school.to_string())
        .json(&json!({ "first_name": "Admin", "last_name": "Entry" }))
        .await;
    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_active_school_follows_tenant_resolution() {
    let app = setup_test_app().await;

    let alice = auth::create_user(app.pool(), "alice@example.com", false).await;
    let alice_token = auth::token_for(alice);
    let school = fixtures::create_school(&app, &alice_token, "Kilimani Academy", "kilimani").await;

    // Single membership resolves without a hint.
    let response = app
        .client()
        .get(&api_path("/schools/active"))
        .authorization_bearer(&alice_token)
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["id"].as_str(),
        Some(school.to_string().as_str())
    );

    // A superuser with no hint has no single school to resolve to.
    let root = auth::create_user(app.pool(), "root@example.com", true).await;
    let response = app
        .client()
        .get(&api_path("/schools/active"))
        .authorization_bearer(&auth::token_for(root))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/applications")).await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .client()
        .get(&api_path("/applications"))
        .authorization_bearer("garbage-token")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}
