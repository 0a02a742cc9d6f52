use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// Education levels whose students do not carry an exam identifier.
pub const NO_EXAM_LEVELS: &[&str] = &["pre_primary"];

/// True when students at this education level sit national exams and
/// therefore carry an exam number.
pub fn is_exam_level(education_level: Option<&str>) -> bool {
    match education_level {
        Some(level) => !NO_EXAM_LEVELS.contains(&level),
        None => true,
    }
}

/// A curriculum is either a global template (no school) or a school-owned
/// instantiation of one - never both, never neither.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Curriculum {
    pub id: Uuid,
    pub school_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub is_template: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Curriculum {
    /// Template exclusivity invariant: templates are tenant-less, tenant
    /// curricula are never templates. Also enforced by a CHECK constraint.
    pub fn validate_template_exclusivity(&self) -> Result<(), AppError> {
        match (self.is_template, self.school_id) {
            (true, None) | (false, Some(_)) => Ok(()),
            (true, Some(_)) => Err(AppError::InvalidInput(
                "A template curriculum cannot belong to a school".to_string(),
            )),
            (false, None) => Err(AppError::InvalidInput(
                "A non-template curriculum must belong to a school".to_string(),
            )),
        }
    }
}

/// Grade level (class) within a curriculum.
///
/// A row with no school must be template content (linked to a template
/// curriculum); a row detached from template content must have a school.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct GradeLevel {
    pub id: Uuid,
    pub school_id: Option<Uuid>,
    pub curriculum_id: Option<Uuid>,
    pub name: String,
    pub short_name: Option<String>,
    pub display_order: i32,
    pub code: Option<String>,
    pub education_level: Option<String>,
    pub pathway: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GradeLevel {
    /// `template_linked` is whether `curriculum_id` points at a template
    /// curriculum (the caller resolves that; this type holds no references).
    pub fn validate_tenancy(&self, template_linked: bool) -> Result<(), AppError> {
        if self.school_id.is_none() && !template_linked {
            return Err(AppError::InvalidInput(
                "A grade level without template content must belong to a school".to_string(),
            ));
        }
        Ok(())
    }
}

/// Academic department. Global rows (no school) act as copy sources.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Department {
    pub id: Uuid,
    pub school_id: Option<Uuid>,
    pub curriculum_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Created-vs-existing counts for one entity kind in a template copy.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct CopyCounts {
    pub created: i64,
    pub existing: i64,
}

impl CopyCounts {
    pub fn total(&self) -> i64 {
        self.created + self.existing
    }
}

/// Observable result of a template propagation run. External callers depend
/// on these counts, not just success/failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CopyReport {
    pub curricula: CopyCounts,
    pub grade_levels: CopyCounts,
    pub departments: CopyCounts,
}

impl CopyReport {
    pub fn total(&self) -> i64 {
        self.curricula.total() + self.grade_levels.total() + self.departments.total()
    }
}
