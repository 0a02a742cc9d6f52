use shule_core::{
    models::{Curriculum, Department, GradeLevel},
    AppError, TenantScope,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const CURRICULUM_COLUMNS: &str =
    "id, school_id, name, description, is_template, created_at, updated_at";
const GRADE_LEVEL_COLUMNS: &str = "id, school_id, curriculum_id, name, short_name, \
     display_order, code, education_level, pathway, created_at, updated_at";
const DEPARTMENT_COLUMNS: &str =
    "id, school_id, curriculum_id, name, description, created_at, updated_at";

/// Repository for tenant academic content: curricula, grade levels, and
/// departments. Template (tenant-less) rows are owned by
/// [`super::templates::TemplateRepository`].
#[derive(Clone)]
pub struct AcademicsRepository {
    pool: PgPool,
}

impl AcademicsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "curricula", db.operation = "select"))]
    pub async fn list_curricula(&self, scope: TenantScope) -> Result<Vec<Curriculum>, AppError> {
        let rows = match scope {
            TenantScope::School(school_id) => {
                sqlx::query_as::<Postgres, Curriculum>(&format!(
                    "SELECT {CURRICULUM_COLUMNS} FROM curricula WHERE school_id = $1 ORDER BY name ASC"
                ))
                .bind(school_id)
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::Unscoped => {
                sqlx::query_as::<Postgres, Curriculum>(&format!(
                    "SELECT {CURRICULUM_COLUMNS} FROM curricula WHERE school_id IS NOT NULL ORDER BY name ASC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::None => Vec::new(),
        };

        Ok(rows)
    }

    /// Create a tenant curriculum. Templates cannot be created here.
    #[tracing::instrument(skip(self), fields(db.table = "curricula", db.operation = "insert"))]
    pub async fn create_curriculum(
        &self,
        school_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Curriculum, AppError> {
        let row = sqlx::query_as::<Postgres, Curriculum>(&format!(
            r#"
            INSERT INTO curricula (school_id, name, description, is_template)
            VALUES ($1, $2, $3, FALSE)
            RETURNING {CURRICULUM_COLUMNS}
            "#,
        ))
        .bind(school_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if super::is_unique_violation(&err) {
                AppError::InvalidInput(format!(
                    "A curriculum named '{}' already exists at this school",
                    name
                ))
            } else {
                err.into()
            }
        })?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "grade_levels", db.operation = "select"))]
    pub async fn list_grade_levels(
        &self,
        scope: TenantScope,
        curriculum_id: Option<Uuid>,
    ) -> Result<Vec<GradeLevel>, AppError> {
        let rows = match scope {
            TenantScope::School(school_id) => {
                sqlx::query_as::<Postgres, GradeLevel>(&format!(
                    r#"
                    SELECT {GRADE_LEVEL_COLUMNS} FROM grade_levels
                    WHERE school_id = $1 AND ($2::uuid IS NULL OR curriculum_id = $2)
                    ORDER BY display_order ASC, name ASC
                    "#,
                ))
                .bind(school_id)
                .bind(curriculum_id)
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::Unscoped => {
                sqlx::query_as::<Postgres, GradeLevel>(&format!(
                    r#"
                    SELECT {GRADE_LEVEL_COLUMNS} FROM grade_levels
                    WHERE school_id IS NOT NULL AND ($1::uuid IS NULL OR curriculum_id = $1)
                    ORDER BY display_order ASC, name ASC
                    "#,
                ))
                .bind(curriculum_id)
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::None => Vec::new(),
        };

        Ok(rows)
    }

    /// Grade levels of one school, for the public application form. Takes
    /// the school id directly because the caller is unauthenticated.
    #[tracing::instrument(skip(self), fields(db.table = "grade_levels", db.operation = "select", school_id = %school_id))]
    pub async fn list_public_grade_levels(
        &self,
        school_id: Uuid,
    ) -> Result<Vec<GradeLevel>, AppError> {
        let rows = sqlx::query_as::<Postgres, GradeLevel>(&format!(
            r#"
            SELECT {GRADE_LEVEL_COLUMNS} FROM grade_levels
            WHERE school_id = $1
            ORDER BY display_order ASC, name ASC
            "#,
        ))
        .bind(school_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "grade_levels", db.operation = "insert"))]
    pub async fn create_grade_level(
        &self,
        school_id: Uuid,
        curriculum_id: Option<Uuid>,
        name: &str,
        education_level: Option<&str>,
        display_order: i32,
    ) -> Result<GradeLevel, AppError> {
        // The curriculum, when given, must belong to the same school.
        if let Some(cid) = curriculum_id {
            let owned = sqlx::query_scalar::<Postgres, bool>(
                "SELECT EXISTS(SELECT 1 FROM curricula WHERE id = $1 AND school_id = $2)",
            )
            .bind(cid)
            .bind(school_id)
            .fetch_one(&self.pool)
            .await?;

            if !owned {
                return Err(AppError::InvalidInput(
                    "Curriculum does not belong to this school".to_string(),
                ));
            }
        }

        let row = sqlx::query_as::<Postgres, GradeLevel>(&format!(
            r#"
            INSERT INTO grade_levels (school_id, curriculum_id, name, education_level, display_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {GRADE_LEVEL_COLUMNS}
            "#,
        ))
        .bind(school_id)
        .bind(curriculum_id)
        .bind(name)
        .bind(education_level)
        .bind(display_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if super::is_unique_violation(&err) {
                AppError::InvalidInput(format!(
                    "A grade level named '{}' already exists in this curriculum",
                    name
                ))
            } else {
                err.into()
            }
        })?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "departments", db.operation = "select"))]
    pub async fn list_departments(&self, scope: TenantScope) -> Result<Vec<Department>, AppError> {
        let rows = match scope {
            TenantScope::School(school_id) => {
                sqlx::query_as::<Postgres, Department>(&format!(
                    "SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE school_id = $1 ORDER BY name ASC"
                ))
                .bind(school_id)
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::Unscoped => {
                sqlx::query_as::<Postgres, Department>(&format!(
                    "SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE school_id IS NOT NULL ORDER BY name ASC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::None => Vec::new(),
        };

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "departments", db.operation = "insert"))]
    pub async fn create_department(
        &self,
        school_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Department, AppError> {
        let row = sqlx::query_as::<Postgres, Department>(&format!(
            r#"
            INSERT INTO departments (school_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING {DEPARTMENT_COLUMNS}
            "#,
        ))
        .bind(school_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if super::is_unique_violation(&err) {
                AppError::InvalidInput(format!(
                    "A department named '{}' already exists at this school",
                    name
                ))
            } else {
                err.into()
            }
        })?;

        Ok(row)
    }
}
