use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use shule_core::AppError;

use crate::auth::models::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCurriculumRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListGradeLevelsQuery {
    pub curriculum_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGradeLevelRequest {
    pub curriculum_id: Option<Uuid>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub education_level: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CopyTemplateRequest {
    /// Copy only this template curriculum; omit to copy all of them.
    pub template_id: Option<Uuid>,
    /// Restrict the grade-level copy to these template rows.
    pub grade_ids: Option<Vec<Uuid>>,
    /// Restrict the department copy to these source rows.
    pub department_ids: Option<Vec<Uuid>>,
}

#[utoipa::path(
    get,
    path = "/api/v1/curricula",
    tag = "academics",
    responses(
        (status = 200, description = "Curricula in the caller's scope", body = [shule_core::models::Curriculum])
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), operation = "list_curricula"))]
pub async fn list_curricula(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.read_scope()?;
    let rows = state.academics.list_curricula(scope).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/v1/curricula",
    tag = "academics",
    request_body = CreateCurriculumRequest,
    responses(
        (status = 201, description = "Curriculum created", body = shule_core::models::Curriculum),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), operation = "create_curriculum"))]
pub async fn create_curriculum(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateCurriculumRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let school_id = ctx.write_scope()?.require_school()?;
    let row = state
        .academics
        .create_curriculum(school_id, &request.name, request.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    get,
    path = "/api/v1/grade-levels",
    tag = "academics",
    params(("curriculum_id" = Option<Uuid>, Query, description = "Filter by curriculum")),
    responses(
        (status = 200, description = "Grade levels in the caller's scope", body = [shule_core::models::GradeLevel])
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), operation = "list_grade_levels"))]
pub async fn list_grade_levels(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListGradeLevelsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.read_scope()?;
    let rows = state
        .academics
        .list_grade_levels(scope, query.curriculum_id)
        .await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/v1/grade-levels",
    tag = "academics",
    request_body = CreateGradeLevelRequest,
    responses(
        (status = 201, description = "Grade level created", body = shule_core::models::GradeLevel),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), operation = "create_grade_level"))]
pub async fn create_grade_level(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateGradeLevelRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let school_id = ctx.write_scope()?.require_school()?;
    let row = state
        .academics
        .create_grade_level(
            school_id,
            request.curriculum_id,
            &request.name,
            request.education_level.as_deref(),
            request.display_order,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    get,
    path = "/api/v1/departments",
    tag = "academics",
    responses(
        (status = 200, description = "Departments in the caller's scope", body = [shule_core::models::Department])
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), operation = "list_departments"))]
pub async fn list_departments(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.read_scope()?;
    let rows = state.academics.list_departments(scope).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/v1/departments",
    tag = "academics",
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = shule_core::models::Department),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), operation = "create_department"))]
pub async fn create_department(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let school_id = ctx.write_scope()?.require_school()?;
    let row = state
        .academics
        .create_department(school_id, &request.name, request.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    get,
    path = "/api/v1/templates",
    tag = "academics",
    responses(
        (status = 200, description = "Template curricula", body = [shule_core::models::Curriculum])
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), operation = "list_templates"))]
pub async fn list_templates(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let rows = state.templates.list_templates().await?;
    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/v1/templates",
    tag = "academics",
    request_body = CreateCurriculumRequest,
    responses(
        (status = 201, description = "Template created", body = shule_core::models::Curriculum),
        (status = 403, description = "Administrator access required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), operation = "create_template"))]
pub async fn create_template(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateCurriculumRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_superuser()?;
    request.validate().map_err(AppError::from)?;

    let row = state
        .templates
        .create_template(&request.name, request.description.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    post,
    path = "/api/v1/templates/{id}/grade-levels",
    tag = "academics",
    params(("id" = Uuid, Path, description = "Template curriculum ID")),
    request_body = CreateGradeLevelRequest,
    responses(
        (status = 201, description = "Template grade level created"),
        (status = 403, description = "Administrator access required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), template_id = %id, operation = "add_template_grade_level"))]
pub async fn add_template_grade_level(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateGradeLevelRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_superuser()?;
    request.validate().map_err(AppError::from)?;

    let grade_id = state
        .templates
        .add_template_grade_level(
            id,
            &request.name,
            request.education_level.as_deref(),
            request.display_order,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": grade_id }))))
}

#[utoipa::path(
    post,
    path = "/api/v1/templates/{id}/departments",
    tag = "academics",
    params(("id" = Uuid, Path, description = "Template curriculum ID")),
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Template department created"),
        (status = 403, description = "Administrator access required", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), template_id = %id, operation = "add_template_department"))]
pub async fn add_template_department(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_superuser()?;
    request.validate().map_err(AppError::from)?;

    let department_id = state
        .templates
        .add_template_department(id, &request.name, request.description.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": department_id })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/academics/copy-template",
    tag = "academics",
    request_body = CopyTemplateRequest,
    responses(
        (status = 200, description = "Template content copied", body = shule_core::models::CopyReport),
        (status = 400, description = "No school context", body = ErrorResponse),
        (status = 404, description = "Template not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), operation = "copy_template"))]
pub async fn copy_template(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CopyTemplateRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let school_id = ctx.write_scope()?.require_school()?;
    let report = state
        .templates
        .copy_to_school(
            school_id,
            request.template_id,
            request.grade_ids.as_deref(),
            request.department_ids.as_deref(),
        )
        .await?;

    Ok(Json(report))
}
