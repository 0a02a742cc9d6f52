use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// How admission/application numbers are generated for a school.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, sqlx::Type)]
#[sqlx(type_name = "admission_number_format", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionNumberFormat {
    /// `2026-0001`
    YearSeq,
    /// `KCB-2026-0001`
    PrefixYearSeq,
    /// Manual entry - the generator never assigns or overwrites a value.
    Custom,
}

/// School (tenant) entity. Owns every other tenant-scoped row transitively.
///
/// The admission-number configuration lives on the school row; the generated
/// sequence state lives in `admission_sequences`, not here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub short_name: Option<String>,
    /// Public URL-safe identifier for unauthenticated lookups.
    pub slug: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: String,
    pub currency: String,
    pub admission_number_format: AdmissionNumberFormat,
    pub admission_prefix: String,
    pub admission_seq_padding: i16,
    /// Activated feature module codes (e.g. "students", "finance").
    pub enabled_modules: Vec<String>,
    pub owner_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl School {
    pub fn display_name(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}

/// Counts returned by the public school-status introspection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SchoolStatusCounts {
    pub curricula: i64,
    pub grade_levels: i64,
    pub departments: i64,
}
