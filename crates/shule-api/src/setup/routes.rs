//! Route table and middleware stack.

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use shule_core::Config;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::middleware::{auth_middleware, AuthState};
use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;

/// Request bodies above this are rejected before reaching handlers.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router {
    let auth_state = Arc::new(AuthState {
        jwt_secret: config.jwt_secret.clone(),
        user_repository: state.users.clone(),
    });

    let public_routes = Router::new()
        .route("/public/schools/{slug}", get(handlers::public::get_school))
        .route(
            "/public/schools/{slug}/grade-levels",
            get(handlers::public::list_grade_levels),
        )
        .route(
            "/public/schools/{slug}/status",
            get(handlers::public::school_status),
        )
        .route(
            "/public/schools/{slug}/applications",
            post(handlers::public::create_application),
        )
        .route(
            "/public/schools/{slug}/applications/{id}",
            get(handlers::public::get_application)
                .patch(handlers::public::update_application),
        );

    let protected_routes = Router::new()
        .route(
            "/schools",
            post(handlers::schools::create_school).get(handlers::schools::list_schools),
        )
        .route("/schools/active", get(handlers::schools::get_active_school))
        .route("/schools/{id}", get(handlers::schools::get_school))
        .route(
            "/schools/{id}/admission-config",
            put(handlers::schools::update_admission_config),
        )
        .route("/schools/{id}/modules", put(handlers::schools::set_module))
        .route(
            "/applications",
            get(handlers::applications::list_applications)
                .post(handlers::applications::create_application),
        )
        .route(
            "/applications/{id}",
            get(handlers::applications::get_application)
                .patch(handlers::applications::update_application)
                .delete(handlers::applications::delete_application),
        )
        .route(
            "/applications/{id}/transition",
            post(handlers::applications::transition_application),
        )
        .route(
            "/applications/{id}/admission-number",
            post(handlers::applications::assign_admission_number),
        )
        .route(
            "/applications/{id}/enroll",
            post(handlers::applications::enroll_application),
        )
        .route(
            "/applications/{id}/documents",
            post(handlers::applications::attach_document)
                .get(handlers::applications::list_documents),
        )
        .route(
            "/applications/{id}/documents/{document_id}/checksum",
            post(handlers::applications::backfill_checksum),
        )
        .route(
            "/applications/{id}/payments",
            post(handlers::applications::record_payment)
                .get(handlers::applications::list_payments),
        )
        .route(
            "/students",
            get(handlers::students::list_students),
        )
        .route("/students/{id}", get(handlers::students::get_student))
        .route(
            "/students/{id}/status",
            put(handlers::students::set_student_status),
        )
        .route(
            "/curricula",
            get(handlers::academics::list_curricula).post(handlers::academics::create_curriculum),
        )
        .route(
            "/grade-levels",
            get(handlers::academics::list_grade_levels)
                .post(handlers::academics::create_grade_level),
        )
        .route(
            "/departments",
            get(handlers::academics::list_departments)
                .post(handlers::academics::create_department),
        )
        .route(
            "/templates",
            get(handlers::academics::list_templates).post(handlers::academics::create_template),
        )
        .route(
            "/templates/{id}/grade-levels",
            post(handlers::academics::add_template_grade_level),
        )
        .route(
            "/templates/{id}/departments",
            post(handlers::academics::add_template_department),
        )
        .route(
            "/academics/copy-template",
            post(handlers::academics::copy_template),
        )
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    Router::new()
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_spec))
        .nest(API_PREFIX, public_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(crate::constants::SCHOOL_HINT_HEADER),
        ]);

    if config.cors_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(crate::api_doc::get_openapi_spec())
}
