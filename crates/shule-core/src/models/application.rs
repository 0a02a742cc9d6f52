use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of an admission application.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    TestScheduled,
    Offered,
    Accepted,
    Rejected,
    Enrolled,
}

impl ApplicationStatus {
    /// REJECTED and ENROLLED admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Enrolled)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApplicationStatus::Draft => "DRAFT",
            ApplicationStatus::Submitted => "SUBMITTED",
            ApplicationStatus::UnderReview => "UNDER_REVIEW",
            ApplicationStatus::TestScheduled => "TEST_SCHEDULED",
            ApplicationStatus::Offered => "OFFERED",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Enrolled => "ENROLLED",
        };
        write!(f, "{}", s)
    }
}

/// A prospective student's enrollment request.
///
/// `admission_number` is null until assigned and unique per school once set.
/// `student_id` is set exactly once, at enrollment, and never cleared by
/// application code (database set-null on student deletion only).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Application {
    pub id: Uuid,
    pub school_id: Uuid,
    pub admission_number: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub guardian_email: Option<String>,
    pub guardian_relationship: Option<String>,
    pub grade_level_applied: Option<Uuid>,
    pub previous_school: Option<String>,
    pub notes: Option<String>,
    pub status: ApplicationStatus,
    /// Stamped exactly once, on the first transition into SUBMITTED.
    pub submitted_at: Option<DateTime<Utc>>,
    pub student_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) if !middle.is_empty() => {
                format!("{} {} {}", self.first_name, middle, self.last_name)
            }
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// Document attached to an application, deduplicated by content checksum
/// within that application. Blob storage is external; only metadata and the
/// SHA-256 hex digest are persisted here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct ApplicationDocument {
    pub id: Uuid,
    pub application_id: Uuid,
    pub file_name: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub checksum: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Admission fee payment recorded against an application. Payments are data,
/// not an enrollment precondition.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct ApplicationFeePayment {
    pub id: Uuid,
    pub application_id: Uuid,
    pub amount: Decimal,
    pub payment_method: String,
    pub receipt_number: Option<String>,
    pub paid_at: DateTime<Utc>,
}
