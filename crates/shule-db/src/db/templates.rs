//! Template propagation: copying global academic content into a school.
//!
//! Copying is get-or-create by name inside one transaction: re-running a
//! copy never duplicates rows and never overwrites tenant edits. The
//! returned [`CopyReport`] distinguishes created from pre-existing rows.

use shule_core::{
    models::{CopyCounts, CopyReport, Curriculum},
    AppError,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const CURRICULUM_COLUMNS: &str =
    "id, school_id, name, description, is_template, created_at, updated_at";

/// Repository for template (tenant-less) academic content and its
/// propagation into schools.
#[derive(Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "curricula", db.operation = "select"))]
    pub async fn list_templates(&self) -> Result<Vec<Curriculum>, AppError> {
        let rows = sqlx::query_as::<Postgres, Curriculum>(&format!(
            "SELECT {CURRICULUM_COLUMNS} FROM curricula WHERE is_template ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Create a template curriculum (no school, by definition).
    #[tracing::instrument(skip(self), fields(db.table = "curricula", db.operation = "insert"))]
    pub async fn create_template(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Curriculum, AppError> {
        let row = sqlx::query_as::<Postgres, Curriculum>(&format!(
            r#"
            INSERT INTO curricula (school_id, name, description, is_template)
            VALUES (NULL, $1, $2, TRUE)
            RETURNING {CURRICULUM_COLUMNS}
            "#,
        ))
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if super::is_unique_violation(&err) {
                AppError::InvalidInput(format!("A template named '{}' already exists", name))
            } else {
                err.into()
            }
        })?;

        Ok(row)
    }

    /// Add a grade level to a template curriculum.
    #[tracing::instrument(skip(self), fields(db.table = "grade_levels", db.operation = "insert", curriculum_id = %template_curriculum_id))]
    pub async fn add_template_grade_level(
        &self,
        template_curriculum_id: Uuid,
        name: &str,
        education_level: Option<&str>,
        display_order: i32,
    ) -> Result<Uuid, AppError> {
        let is_template = sqlx::query_scalar::<Postgres, bool>(
            "SELECT is_template FROM curricula WHERE id = $1",
        )
        .bind(template_curriculum_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Template curriculum not found".to_string()))?;

        if !is_template {
            return Err(AppError::InvalidInput(
                "Grade level templates must be added to a template curriculum".to_string(),
            ));
        }

        let id = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            INSERT INTO grade_levels (school_id, curriculum_id, name, education_level, display_order)
            VALUES (NULL, $1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(template_curriculum_id)
        .bind(name)
        .bind(education_level)
        .bind(display_order)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Add a department to a template curriculum (tenant-less copy source).
    #[tracing::instrument(skip(self), fields(db.table = "departments", db.operation = "insert", curriculum_id = %template_curriculum_id))]
    pub async fn add_template_department(
        &self,
        template_curriculum_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Uuid, AppError> {
        let is_template = sqlx::query_scalar::<Postgres, bool>(
            "SELECT is_template FROM curricula WHERE id = $1",
        )
        .bind(template_curriculum_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Template curriculum not found".to_string()))?;

        if !is_template {
            return Err(AppError::InvalidInput(
                "Department templates must be added to a template curriculum".to_string(),
            ));
        }

        let id = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            INSERT INTO departments (school_id, curriculum_id, name, description)
            VALUES (NULL, $1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(template_curriculum_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Copy template content into a school: all template curricula (or just
    /// `template_id`), their grade levels, and their departments (template-
    /// linked or global). One transaction; idempotent by name. `grade_ids`
    /// and `department_ids` restrict the copy to those source rows.
    #[tracing::instrument(skip(self, grade_ids, department_ids), fields(db.table = "curricula", db.operation = "copy", school_id = %school_id))]
    pub async fn copy_to_school(
        &self,
        school_id: Uuid,
        template_id: Option<Uuid>,
        grade_ids: Option<&[Uuid]>,
        department_ids: Option<&[Uuid]>,
    ) -> Result<CopyReport, AppError> {
        let mut tx = self.pool.begin().await?;

        let templates = match template_id {
            Some(id) => {
                let row = sqlx::query_as::<Postgres, Curriculum>(&format!(
                    "SELECT {CURRICULUM_COLUMNS} FROM curricula WHERE id = $1 AND is_template"
                ))
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Template curriculum not found".to_string()))?;
                vec![row]
            }
            None => {
                sqlx::query_as::<Postgres, Curriculum>(&format!(
                    "SELECT {CURRICULUM_COLUMNS} FROM curricula WHERE is_template ORDER BY name ASC"
                ))
                .fetch_all(&mut *tx)
                .await?
            }
        };

        let mut report = CopyReport::default();

        for template in &templates {
            let (curriculum_id, created) =
                Self::get_or_create_curriculum(&mut tx, school_id, template).await?;
            bump(&mut report.curricula, created);

            let grades = Self::copy_grade_levels(
                &mut tx,
                school_id,
                template.id,
                curriculum_id,
                grade_ids,
            )
            .await?;
            report.grade_levels.created += grades.created;
            report.grade_levels.existing += grades.existing;

            let departments = Self::copy_departments(
                &mut tx,
                school_id,
                template.id,
                curriculum_id,
                department_ids,
            )
            .await?;
            report.departments.created += departments.created;
            report.departments.existing += departments.existing;
        }

        tx.commit().await?;

        tracing::info!(
            school_id = %school_id,
            created = report.curricula.created + report.grade_levels.created + report.departments.created,
            existing = report.curricula.existing + report.grade_levels.existing + report.departments.existing,
            "Template copy finished"
        );

        Ok(report)
    }

    /// Get-or-create the school's instantiation of one template curriculum.
    async fn get_or_create_curriculum(
        tx: &mut Transaction<'_, Postgres>,
        school_id: Uuid,
        template: &Curriculum,
    ) -> Result<(Uuid, bool), AppError> {
        let existing = sqlx::query_scalar::<Postgres, Uuid>(
            "SELECT id FROM curricula WHERE school_id = $1 AND name = $2",
        )
        .bind(school_id)
        .bind(&template.name)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(id) = existing {
            return Ok((id, false));
        }

        let id = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            INSERT INTO curricula (school_id, name, description, is_template)
            VALUES ($1, $2, $3, FALSE)
            RETURNING id
            "#,
        )
        .bind(school_id)
        .bind(&template.name)
        .bind(&template.description)
        .fetch_one(&mut **tx)
        .await?;

        Ok((id, true))
    }

    async fn copy_grade_levels(
        tx: &mut Transaction<'_, Postgres>,
        school_id: Uuid,
        template_curriculum_id: Uuid,
        target_curriculum_id: Uuid,
        subset: Option<&[Uuid]>,
    ) -> Result<CopyCounts, AppError> {
        let source_ids = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            SELECT id FROM grade_levels
            WHERE curriculum_id = $1 AND school_id IS NULL
              AND ($2::uuid[] IS NULL OR id = ANY($2))
            ORDER BY display_order ASC
            "#,
        )
        .bind(template_curriculum_id)
        .bind(subset)
        .fetch_all(&mut **tx)
        .await?;

        let mut counts = CopyCounts::default();

        for source_id in source_ids {
            // ON CONFLICT against the per-school name index makes the copy
            // idempotent without a read-then-write race.
            let inserted = sqlx::query_scalar::<Postgres, Uuid>(
                r#"
                INSERT INTO grade_levels
                    (school_id, curriculum_id, name, short_name, display_order, code, education_level, pathway)
                SELECT $2, $3, name, short_name, display_order, code, education_level, pathway
                FROM grade_levels WHERE id = $1
                ON CONFLICT (school_id, curriculum_id, name) WHERE school_id IS NOT NULL DO NOTHING
                RETURNING id
                "#,
            )
            .bind(source_id)
            .bind(school_id)
            .bind(target_curriculum_id)
            .fetch_optional(&mut **tx)
            .await?;

            bump(&mut counts, inserted.is_some());
        }

        Ok(counts)
    }

    /// Copy departments that are global (tenant-less, unlinked) or linked to
    /// this template curriculum. Copies are linked to the tenant curriculum.
    async fn copy_departments(
        tx: &mut Transaction<'_, Postgres>,
        school_id: Uuid,
        template_curriculum_id: Uuid,
        target_curriculum_id: Uuid,
        subset: Option<&[Uuid]>,
    ) -> Result<CopyCounts, AppError> {
        let source_ids = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            SELECT id FROM departments
            WHERE school_id IS NULL
              AND (curriculum_id IS NULL OR curriculum_id = $1)
              AND ($2::uuid[] IS NULL OR id = ANY($2))
            ORDER BY name ASC
            "#,
        )
        .bind(template_curriculum_id)
        .bind(subset)
        .fetch_all(&mut **tx)
        .await?;

        let mut counts = CopyCounts::default();

        for source_id in source_ids {
            let inserted = sqlx::query_scalar::<Postgres, Uuid>(
                r#"
                INSERT INTO departments (school_id, curriculum_id, name, description)
                SELECT $2, $3, name, description FROM departments WHERE id = $1
                ON CONFLICT (school_id, name) WHERE school_id IS NOT NULL DO NOTHING
                RETURNING id
                "#,
            )
            .bind(source_id)
            .bind(school_id)
            .bind(target_curriculum_id)
            .fetch_optional(&mut **tx)
            .await?;

            bump(&mut counts, inserted.is_some());
        }

        Ok(counts)
    }
}

fn bump(counts: &mut CopyCounts, created: bool) {
    if created {
        counts.created += 1;
    } else {
        counts.existing += 1;
    }
}
