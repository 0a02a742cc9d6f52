//! Unauthenticated endpoints for the public application flow: school lookup
//! by slug, its grade levels, setup-status counts, and draft application
//! submission.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use shule_core::{
    models::{Application, ApplicationStatus, School, SchoolStatusCounts},
    AppError, TenantScope,
};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::applications::{CreateApplicationRequest, UpdateApplicationRequest};
use crate::state::AppState;

/// Public projection of a school: contact surface only, never the
/// admission-number configuration or ownership.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicSchool {
    pub id: Uuid,
    pub name: String,
    pub short_name: Option<String>,
    pub slug: String,
    pub city: Option<String>,
    pub country: String,
    pub currency: String,
}

impl From<School> for PublicSchool {
    fn from(school: School) -> Self {
        Self {
            id: school.id,
            name: school.name,
            short_name: school.short_name,
            slug: school.slug,
            city: school.city,
            country: school.country,
            currency: school.currency,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PublicApplicationReceipt {
    pub id: Uuid,
    pub status: ApplicationStatus,
}

#[utoipa::path(
    get,
    path = "/api/v1/public/schools/{slug}",
    tag = "public",
    params(("slug" = String, Path, description = "School slug")),
    responses(
        (status = 200, description = "School found", body = PublicSchool),
        (status = 404, description = "School not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(slug = %slug, operation = "public_get_school"))]
pub async fn get_school(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let school = lookup_school(&state, &slug).await?;
    Ok(Json(PublicSchool::from(school)))
}

#[utoipa::path(
    get,
    path = "/api/v1/public/schools/{slug}/grade-levels",
    tag = "public",
    params(("slug" = String, Path, description = "School slug")),
    responses(
        (status = 200, description = "Grade levels offered by the school", body = [shule_core::models::GradeLevel]),
        (status = 404, description = "School not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(slug = %slug, operation = "public_list_grade_levels"))]
pub async fn list_grade_levels(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let school = lookup_school(&state, &slug).await?;
    let rows = state.academics.list_public_grade_levels(school.id).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/v1/public/schools/{slug}/status",
    tag = "public",
    params(("slug" = String, Path, description = "School slug")),
    responses(
        (status = 200, description = "Academic setup counts", body = SchoolStatusCounts),
        (status = 404, description = "School not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(slug = %slug, operation = "public_school_status"))]
pub async fn school_status(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let school = lookup_school(&state, &slug).await?;
    let counts = state.schools.get_status_counts(school.id).await?;
    Ok(Json(counts))
}

#[utoipa::path(
    post,
    path = "/api/v1/public/schools/{slug}/applications",
    tag = "public",
    params(("slug" = String, Path, description = "School slug")),
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "Draft application created", body = PublicApplicationReceipt),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "School not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(slug = %slug, operation = "public_create_application"))]
pub async fn create_application(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let school = lookup_school(&state, &slug).await?;
    let app = state
        .applications
        .create_application(school.id, request.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PublicApplicationReceipt {
            id: app.id,
            status: app.status,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/public/schools/{slug}/applications/{id}",
    tag = "public",
    params(
        ("slug" = String, Path, description = "School slug"),
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Draft application", body = shule_core::models::Application),
        (status = 404, description = "No draft application with this id", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(slug = %slug, application_id = %id, operation = "public_get_application"))]
pub async fn get_application(
    State(state): State<Arc<AppState>>,
    Path((slug, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let school = lookup_school(&state, &slug).await?;
    let app = lookup_draft(&state, school.id, id).await?;
    Ok(Json(app))
}

#[utoipa::path(
    patch,
    path = "/api/v1/public/schools/{slug}/applications/{id}",
    tag = "public",
    params(
        ("slug" = String, Path, description = "School slug"),
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateApplicationRequest,
    responses(
        (status = 200, description = "Draft updated", body = shule_core::models::Application),
        (status = 404, description = "No draft application with this id", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(slug = %slug, application_id = %id, operation = "public_update_application"))]
pub async fn update_application(
    State(state): State<Arc<AppState>>,
    Path((slug, id)): Path<(String, Uuid)>,
    Json(request): Json<UpdateApplicationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let school = lookup_school(&state, &slug).await?;
    lookup_draft(&state, school.id, id).await?;

    let updated = state
        .applications
        .update_application(TenantScope::School(school.id), id, request.into())
        .await?;

    Ok(Json(updated))
}

async fn lookup_school(state: &AppState, slug: &str) -> Result<School, AppError> {
    state
        .schools
        .get_school_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("School not found".to_string()))
}

/// Fetch an application for the public surface. Anything past DRAFT is
/// reported as not found so the unauthenticated side never learns review
/// progress.
async fn lookup_draft(
    state: &AppState,
    school_id: Uuid,
    id: Uuid,
) -> Result<Application, AppError> {
    state
        .applications
        .get_application(TenantScope::School(school_id), id)
        .await?
        .filter(|app| app.status == ApplicationStatus::Draft)
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))
}
