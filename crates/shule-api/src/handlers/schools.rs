use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shule_core::{models::AdmissionNumberFormat, resolve_tenant, AccessKind, AppError};
use shule_db::db::schools::{AdmissionConfigUpdate, NewSchool};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::models::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSchoolRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub short_name: Option<String>,
    /// URL-safe identifier used by the public application endpoints.
    #[validate(length(min = 2, max = 64), custom(function = validate_slug))]
    pub slug: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    let ok = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if ok {
        Ok(())
    } else {
        Err(validator::ValidationError::new("slug"))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAdmissionConfigRequest {
    pub admission_number_format: AdmissionNumberFormat,
    #[serde(default)]
    pub admission_prefix: String,
    pub admission_seq_padding: i16,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetModuleRequest {
    pub module: String,
    pub enabled: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/schools",
    tag = "schools",
    request_body = CreateSchoolRequest,
    responses(
        (status = 201, description = "School created", body = shule_core::models::School),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), operation = "create_school"))]
pub async fn create_school(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSchoolRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let school = state
        .schools
        .create_school(
            ctx.user_id(),
            NewSchool {
                name: request.name,
                short_name: request.short_name,
                slug: request.slug,
                email: request.email,
                phone: request.phone,
                address: request.address,
                city: request.city,
            },
        )
        .await?;

    tracing::info!(school_id = %school.id, school = %school.display_name(), "School created");

    Ok((StatusCode::CREATED, Json(school)))
}

#[utoipa::path(
    get,
    path = "/api/v1/schools",
    tag = "schools",
    responses(
        (status = 200, description = "Schools visible to the caller", body = [shule_core::models::School])
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), operation = "list_schools"))]
pub async fn list_schools(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.read_scope()?;
    let schools = state.schools.list_schools_for_user(scope, ctx.user_id()).await?;
    Ok(Json(schools))
}

#[utoipa::path(
    get,
    path = "/api/v1/schools/active",
    tag = "schools",
    responses(
        (status = 200, description = "School the request resolves to", body = shule_core::models::School),
        (status = 404, description = "No single school in scope; pass the x-school-id header", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), operation = "get_active_school"))]
pub async fn get_active_school(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let school_id = ctx
        .read_scope()?
        .school_id()
        .ok_or_else(|| AppError::NotFound("No active school for this request".to_string()))?;

    let school = state
        .schools
        .get_school(school_id)
        .await?
        .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;

    Ok(Json(school))
}

#[utoipa::path(
    get,
    path = "/api/v1/schools/{id}",
    tag = "schools",
    params(("id" = Uuid, Path, description = "School ID")),
    responses(
        (status = 200, description = "School found", body = shule_core::models::School),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "School not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), school_id = %id, operation = "get_school"))]
pub async fn get_school(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    // The path id acts as the tenant hint: membership is enforced here.
    resolve_tenant(&ctx.principal, Some(id), AccessKind::Read)?;

    let school = state
        .schools
        .get_school(id)
        .await?
        .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;

    Ok(Json(school))
}

#[utoipa::path(
    put,
    path = "/api/v1/schools/{id}/admission-config",
    tag = "schools",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = UpdateAdmissionConfigRequest,
    responses(
        (status = 200, description = "Configuration updated", body = shule_core::models::School),
        (status = 400, description = "Invalid configuration", body = ErrorResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), school_id = %id, operation = "update_admission_config"))]
pub async fn update_admission_config(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAdmissionConfigRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    resolve_tenant(&ctx.principal, Some(id), AccessKind::Write)?;

    let school = state
        .schools
        .update_admission_config(
            id,
            AdmissionConfigUpdate {
                admission_number_format: request.admission_number_format,
                admission_prefix: request.admission_prefix,
                admission_seq_padding: request.admission_seq_padding,
            },
        )
        .await?;

    Ok(Json(school))
}

#[utoipa::path(
    put,
    path = "/api/v1/schools/{id}/modules",
    tag = "schools",
    params(("id" = Uuid, Path, description = "School ID")),
    request_body = SetModuleRequest,
    responses(
        (status = 200, description = "Module toggled", body = shule_core::models::School),
        (status = 403, description = "Not a member", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), school_id = %id, operation = "set_module"))]
pub async fn set_module(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetModuleRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    resolve_tenant(&ctx.principal, Some(id), AccessKind::Write)?;

    let school = state
        .schools
        .set_module_enabled(id, &request.module, request.enabled)
        .await?;

    Ok(Json(school))
}
