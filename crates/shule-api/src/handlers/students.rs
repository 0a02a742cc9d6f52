use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shule_core::{models::StudentStatus, AppError};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::models::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListStudentsQuery {
    pub status: Option<StudentStatus>,
    /// Exact admission-number lookup; requires a single-school scope.
    pub admission_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetStudentStatusRequest {
    pub status: StudentStatus,
}

#[utoipa::path(
    get,
    path = "/api/v1/students",
    tag = "students",
    params(
        ("status" = Option<StudentStatus>, Query, description = "Filter by status"),
        ("admission_number" = Option<String>, Query, description = "Exact admission-number lookup")
    ),
    responses(
        (status = 200, description = "Students in the caller's scope", body = [shule_core::models::Student])
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), operation = "list_students"))]
pub async fn list_students(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListStudentsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.read_scope()?;

    if let Some(number) = query.admission_number {
        let school_id = scope.require_school()?;
        let students = state
            .students
            .get_by_admission_number(school_id, &number)
            .await?
            .into_iter()
            .filter(|s| query.status.map_or(true, |status| s.status == status))
            .collect::<Vec<_>>();
        return Ok(Json(students));
    }

    let students = state.students.list_students(scope, query.status).await?;
    Ok(Json(students))
}

#[utoipa::path(
    get,
    path = "/api/v1/students/{id}",
    tag = "students",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student found", body = shule_core::models::Student),
        (status = 404, description = "Student not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), student_id = %id, operation = "get_student"))]
pub async fn get_student(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.read_scope()?;
    let student = state
        .students
        .get_student(scope, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    Ok(Json(student))
}

#[utoipa::path(
    put,
    path = "/api/v1/students/{id}/status",
    tag = "students",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = SetStudentStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = shule_core::models::Student),
        (status = 404, description = "Student not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), student_id = %id, operation = "set_student_status"))]
pub async fn set_student_status(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetStudentStatusRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.write_scope()?;
    let student = state.students.set_status(scope, id, request.status).await?;
    Ok(Json(student))
}
