use shule_core::{
    models::{AdmissionNumberFormat, School, SchoolStatusCounts},
    AppError, TenantScope,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const SCHOOL_COLUMNS: &str = "id, name, short_name, slug, email, phone, address, city, country, \
     currency, admission_number_format, admission_prefix, admission_seq_padding, \
     enabled_modules, owner_user_id, created_at, updated_at";

/// New-school parameters. Everything omitted takes the schema default
/// (country, currency, admission format).
#[derive(Debug, Clone)]
pub struct NewSchool {
    pub name: String,
    pub short_name: Option<String>,
    pub slug: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// Admission-number configuration update.
#[derive(Debug, Clone)]
pub struct AdmissionConfigUpdate {
    pub admission_number_format: AdmissionNumberFormat,
    pub admission_prefix: String,
    pub admission_seq_padding: i16,
}

/// Repository for school (tenant) rows and memberships.
#[derive(Clone)]
pub struct SchoolRepository {
    pool: PgPool,
}

impl SchoolRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a school owned by `owner_user_id` and enroll the owner as a
    /// member in the same transaction.
    #[tracing::instrument(skip(self, school), fields(db.table = "schools", db.operation = "insert"))]
    pub async fn create_school(
        &self,
        owner_user_id: Uuid,
        school: NewSchool,
    ) -> Result<School, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<Postgres, School>(&format!(
            r#"
            INSERT INTO schools (name, short_name, slug, email, phone, address, city, owner_user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SCHOOL_COLUMNS}
            "#,
        ))
        .bind(&school.name)
        .bind(&school.short_name)
        .bind(&school.slug)
        .bind(&school.email)
        .bind(&school.phone)
        .bind(&school.address)
        .bind(&school.city)
        .bind(owner_user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if super::is_unique_violation(&err) {
                AppError::InvalidInput(format!("Slug '{}' is already taken", school.slug))
            } else {
                err.into()
            }
        })?;

        sqlx::query("INSERT INTO school_members (school_id, user_id) VALUES ($1, $2)")
            .bind(created.id)
            .bind(owner_user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    /// Schools visible to the caller: their memberships, or all schools for
    /// an unscoped superuser read. `TenantScope::None` yields nothing.
    #[tracing::instrument(skip(self), fields(db.table = "schools", db.operation = "select"))]
    pub async fn list_schools_for_user(
        &self,
        scope: TenantScope,
        user_id: Uuid,
    ) -> Result<Vec<School>, AppError> {
        let schools = match scope {
            TenantScope::School(school_id) => {
                sqlx::query_as::<Postgres, School>(&format!(
                    "SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = $1"
                ))
                .bind(school_id)
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::Unscoped => {
                sqlx::query_as::<Postgres, School>(&format!(
                    "SELECT {SCHOOL_COLUMNS} FROM schools ORDER BY name ASC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::None => {
                // No resolvable tenant: still surface the caller's own
                // memberships so multi-school users can pick one.
                sqlx::query_as::<Postgres, School>(&format!(
                    r#"
                    SELECT {SCHOOL_COLUMNS} FROM schools
                    WHERE owner_user_id = $1
                       OR id IN (SELECT school_id FROM school_members WHERE user_id = $1)
                    ORDER BY name ASC
                    "#
                ))
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(schools)
    }

    #[tracing::instrument(skip(self), fields(db.table = "schools", db.operation = "select", db.record_id = %id))]
    pub async fn get_school(&self, id: Uuid) -> Result<Option<School>, AppError> {
        let school = sqlx::query_as::<Postgres, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(school)
    }

    /// Public lookup by slug, for unauthenticated application flows.
    #[tracing::instrument(skip(self), fields(db.table = "schools", db.operation = "select"))]
    pub async fn get_school_by_slug(&self, slug: &str) -> Result<Option<School>, AppError> {
        let school = sqlx::query_as::<Postgres, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(school)
    }

    /// Update the admission-number configuration. Changing the format or
    /// prefix starts a fresh counter series; existing numbers are untouched.
    #[tracing::instrument(skip(self, update), fields(db.table = "schools", db.operation = "update", db.record_id = %school_id))]
    pub async fn update_admission_config(
        &self,
        school_id: Uuid,
        update: AdmissionConfigUpdate,
    ) -> Result<School, AppError> {
        if update.admission_number_format == AdmissionNumberFormat::PrefixYearSeq
            && update.admission_prefix.trim().is_empty()
        {
            return Err(AppError::InvalidInput(
                "PREFIX_YEAR_SEQ requires a non-empty admission prefix".to_string(),
            ));
        }
        if update.admission_seq_padding < 1 || update.admission_seq_padding > 10 {
            return Err(AppError::InvalidInput(
                "Admission sequence padding must be between 1 and 10".to_string(),
            ));
        }

        let school = sqlx::query_as::<Postgres, School>(&format!(
            r#"
            UPDATE schools
            SET admission_number_format = $2,
                admission_prefix = $3,
                admission_seq_padding = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SCHOOL_COLUMNS}
            "#,
        ))
        .bind(school_id)
        .bind(update.admission_number_format)
        .bind(&update.admission_prefix)
        .bind(update.admission_seq_padding)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;

        Ok(school)
    }

    /// Toggle a feature module on or off for a school.
    #[tracing::instrument(skip(self), fields(db.table = "schools", db.operation = "update", db.record_id = %school_id))]
    pub async fn set_module_enabled(
        &self,
        school_id: Uuid,
        module: &str,
        enabled: bool,
    ) -> Result<School, AppError> {
        let sql = if enabled {
            format!(
                r#"
                UPDATE schools
                SET enabled_modules = ARRAY(SELECT DISTINCT unnest(enabled_modules || $2::text)),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING {SCHOOL_COLUMNS}
                "#
            )
        } else {
            format!(
                r#"
                UPDATE schools
                SET enabled_modules = array_remove(enabled_modules, $2::text),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING {SCHOOL_COLUMNS}
                "#
            )
        };

        let school = sqlx::query_as::<Postgres, School>(&sql)
            .bind(school_id)
            .bind(module)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;

        Ok(school)
    }

    /// Academic-content counts for the public setup-status endpoint.
    #[tracing::instrument(skip(self), fields(db.table = "schools", db.operation = "select", db.record_id = %school_id))]
    pub async fn get_status_counts(
        &self,
        school_id: Uuid,
    ) -> Result<SchoolStatusCounts, AppError> {
        let (curricula, grade_levels, departments) =
            sqlx::query_as::<Postgres, (i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM curricula WHERE school_id = $1),
                    (SELECT COUNT(*) FROM grade_levels WHERE school_id = $1),
                    (SELECT COUNT(*) FROM departments WHERE school_id = $1)
                "#,
            )
            .bind(school_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(SchoolStatusCounts {
            curricula,
            grade_levels,
            departments,
        })
    }

}
