use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use base64::Engine;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shule_core::{models::ApplicationStatus, AppError};
use shule_db::db::applications::{ApplicationUpdate, NewApplication};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::models::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListApplicationsQuery {
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateApplicationRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    pub middle_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    #[validate(email)]
    pub guardian_email: Option<String>,
    pub guardian_relationship: Option<String>,
    pub grade_level_applied: Option<Uuid>,
    pub previous_school: Option<String>,
    pub notes: Option<String>,
}

impl From<CreateApplicationRequest> for NewApplication {
    fn from(req: CreateApplicationRequest) -> Self {
        NewApplication {
            first_name: req.first_name,
            middle_name: req.middle_name,
            last_name: req.last_name,
            gender: req.gender,
            date_of_birth: req.date_of_birth,
            nationality: req.nationality,
            guardian_name: req.guardian_name,
            guardian_phone: req.guardian_phone,
            guardian_email: req.guardian_email,
            guardian_relationship: req.guardian_relationship,
            grade_level_applied: req.grade_level_applied,
            previous_school: req.previous_school,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateApplicationRequest {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub guardian_email: Option<String>,
    pub guardian_relationship: Option<String>,
    pub grade_level_applied: Option<Uuid>,
    pub previous_school: Option<String>,
    pub notes: Option<String>,
}

impl From<UpdateApplicationRequest> for ApplicationUpdate {
    fn from(req: UpdateApplicationRequest) -> Self {
        ApplicationUpdate {
            first_name: req.first_name,
            middle_name: req.middle_name,
            last_name: req.last_name,
            gender: req.gender,
            guardian_name: req.guardian_name,
            guardian_phone: req.guardian_phone,
            guardian_email: req.guardian_email,
            guardian_relationship: req.guardian_relationship,
            grade_level_applied: req.grade_level_applied,
            previous_school: req.previous_school,
            notes: req.notes,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    pub target: ApplicationStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignAdmissionNumberRequest {
    /// Manually chosen number for schools with CUSTOM numbering. Omit to
    /// let the generator allocate one.
    pub custom_number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdmissionNumberResponse {
    /// Null when the school uses CUSTOM numbering and no number was given.
    pub admission_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EnrollRequest {
    pub exam_number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentResponse {
    pub student_id: Uuid,
    pub admission_number: String,
    /// False on the idempotent path, when the application was already
    /// enrolled and the existing student is returned.
    pub created: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AttachDocumentRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    pub content_type: Option<String>,
    /// Base64-encoded file content; only its checksum and size are stored.
    pub content_base64: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BackfillChecksumRequest {
    /// Base64-encoded content of the stored document, re-read from blob
    /// storage by the operator running the backfill.
    pub content_base64: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BackfillChecksumResponse {
    pub updated: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordPaymentRequest {
    pub amount: Decimal,
    pub payment_method: String,
    pub receipt_number: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/applications",
    tag = "applications",
    params(("status" = Option<ApplicationStatus>, Query, description = "Filter by status")),
    responses(
        (status = 200, description = "Applications in the caller's scope", body = [shule_core::models::Application])
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), operation = "list_applications"))]
pub async fn list_applications(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.read_scope()?;
    let apps = state.applications.list_applications(scope, query.status).await?;
    Ok(Json(apps))
}

#[utoipa::path(
    post,
    path = "/api/v1/applications",
    tag = "applications",
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "Draft application created", body = shule_core::models::Application),
        (status = 400, description = "Invalid request or no school context", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), operation = "create_application"))]
pub async fn create_application(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let school_id = ctx.write_scope()?.require_school()?;
    let app = state
        .applications
        .create_application(school_id, request.into())
        .await?;

    Ok((StatusCode::CREATED, Json(app)))
}

#[utoipa::path(
    get,
    path = "/api/v1/applications/{id}",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application found", body = shule_core::models::Application),
        (status = 404, description = "Application not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), application_id = %id, operation = "get_application"))]
pub async fn get_application(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.read_scope()?;
    let app = state
        .applications
        .get_application(scope, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

    Ok(Json(app))
}

#[utoipa::path(
    patch,
    path = "/api/v1/applications/{id}",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateApplicationRequest,
    responses(
        (status = 200, description = "Application updated", body = shule_core::models::Application),
        (status = 404, description = "Application not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), application_id = %id, operation = "update_application"))]
pub async fn update_application(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateApplicationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.write_scope()?;
    let app = state
        .applications
        .update_application(scope, id, request.into())
        .await?;

    Ok(Json(app))
}

#[utoipa::path(
    delete,
    path = "/api/v1/applications/{id}",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 204, description = "Application deleted"),
        (status = 400, description = "Enrolled applications cannot be deleted", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), application_id = %id, operation = "delete_application"))]
pub async fn delete_application(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.write_scope()?;
    state.applications.delete_application(scope, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/applications/{id}/transition",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Status updated", body = shule_core::models::Application),
        (status = 409, description = "Transition not allowed", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), application_id = %id, operation = "transition_application"))]
pub async fn transition_application(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.write_scope()?;
    let app = state
        .applications
        .transition_status(scope, id, request.target)
        .await?;

    Ok(Json(app))
}

#[utoipa::path(
    post,
    path = "/api/v1/applications/{id}/admission-number",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = AssignAdmissionNumberRequest,
    responses(
        (status = 200, description = "Admission number assigned (or already present)", body = AdmissionNumberResponse),
        (status = 400, description = "Invalid or duplicate number", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), application_id = %id, operation = "assign_admission_number"))]
pub async fn assign_admission_number(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignAdmissionNumberRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.write_scope()?;

    let admission_number = match request.custom_number {
        Some(number) => {
            let app = state
                .applications
                .set_custom_admission_number(scope, id, &number)
                .await?;
            app.admission_number
        }
        None => state.applications.assign_admission_number(scope, id).await?,
    };

    Ok(Json(AdmissionNumberResponse { admission_number }))
}

#[utoipa::path(
    post,
    path = "/api/v1/applications/{id}/enroll",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = EnrollRequest,
    responses(
        (status = 201, description = "Student created", body = EnrollmentResponse),
        (status = 200, description = "Application was already enrolled", body = EnrollmentResponse),
        (status = 409, description = "Enrollment precondition failed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), application_id = %id, operation = "enroll_application"))]
pub async fn enroll_application(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<EnrollRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.write_scope()?;
    let outcome = state
        .enrollment
        .enroll(scope, id, request.exam_number)
        .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(EnrollmentResponse {
            student_id: outcome.student_id,
            admission_number: outcome.admission_number,
            created: outcome.created,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/applications/{id}/documents",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = AttachDocumentRequest,
    responses(
        (status = 201, description = "Document attached (or deduplicated)", body = shule_core::models::ApplicationDocument),
        (status = 404, description = "Application not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), application_id = %id, operation = "attach_document"))]
pub async fn attach_document(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<AttachDocumentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;

    let content = base64::engine::general_purpose::STANDARD
        .decode(&request.content_base64)
        .map_err(|err| AppError::InvalidInput(format!("Invalid base64 content: {}", err)))?;

    let scope = ctx.write_scope()?;
    let doc = state
        .applications
        .attach_document(
            scope,
            id,
            &request.file_name,
            request.content_type.as_deref(),
            &content,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(doc)))
}

#[utoipa::path(
    get,
    path = "/api/v1/applications/{id}/documents",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Documents for the application", body = [shule_core::models::ApplicationDocument]),
        (status = 404, description = "Application not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), application_id = %id, operation = "list_documents"))]
pub async fn list_documents(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.read_scope()?;
    let docs = state.applications.list_documents(scope, id).await?;
    Ok(Json(docs))
}

#[utoipa::path(
    post,
    path = "/api/v1/applications/{id}/documents/{document_id}/checksum",
    tag = "applications",
    params(
        ("id" = Uuid, Path, description = "Application ID"),
        ("document_id" = Uuid, Path, description = "Document ID")
    ),
    request_body = BackfillChecksumRequest,
    responses(
        (status = 200, description = "Checksum backfilled (updated=false when one was already present)", body = BackfillChecksumResponse),
        (status = 403, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), application_id = %id, document_id = %document_id, operation = "backfill_checksum"))]
pub async fn backfill_checksum(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path((id, document_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<BackfillChecksumRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    ctx.require_superuser()?;

    let content = base64::engine::general_purpose::STANDARD
        .decode(&request.content_base64)
        .map_err(|err| AppError::InvalidInput(format!("Invalid base64 content: {}", err)))?;

    // The document must belong to a visible application.
    let docs = state
        .applications
        .list_documents(ctx.read_scope()?, id)
        .await?;
    if !docs.iter().any(|doc| doc.id == document_id) {
        return Err(AppError::NotFound("Document not found".to_string()).into());
    }

    let updated = state
        .applications
        .backfill_document_checksum(document_id, &content)
        .await?;

    Ok(Json(BackfillChecksumResponse { updated }))
}

#[utoipa::path(
    post,
    path = "/api/v1/applications/{id}/payments",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = shule_core::models::ApplicationFeePayment),
        (status = 404, description = "Application not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %ctx.user_id(), application_id = %id, operation = "record_payment"))]
pub async fn record_payment(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.write_scope()?;
    let payment = state
        .applications
        .record_fee_payment(
            scope,
            id,
            request.amount,
            &request.payment_method,
            request.receipt_number.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    get,
    path = "/api/v1/applications/{id}/payments",
    tag = "applications",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Payments for the application", body = [shule_core::models::ApplicationFeePayment]),
        (status = 404, description = "Application not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %ctx.user_id(), application_id = %id, operation = "list_payments"))]
pub async fn list_payments(
    ctx: AuthContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let scope = ctx.read_scope()?;
    let payments = state.applications.list_fee_payments(scope, id).await?;
    Ok(Json(payments))
}
