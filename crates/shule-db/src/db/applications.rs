use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use shule_core::{
    models::{
        Application, ApplicationDocument, ApplicationFeePayment, ApplicationStatus, School,
    },
    workflow, AppError, TenantScope,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::admission_numbers::AdmissionNumberGenerator;

const APPLICATION_COLUMNS: &str = "id, school_id, admission_number, first_name, middle_name, \
     last_name, gender, date_of_birth, nationality, guardian_name, guardian_phone, \
     guardian_email, guardian_relationship, grade_level_applied, previous_school, notes, \
     status, submitted_at, student_id, created_at, updated_at";

/// Retries for admission-number assignment when a concurrent writer lands
/// the same number first (possible only against hand-entered numbers).
const MAX_ASSIGN_ATTEMPTS: u32 = 5;

/// New-application fields. Status always starts at DRAFT; the admission
/// number is assigned later, never at creation.
#[derive(Debug, Clone, Default)]
pub struct NewApplication {
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
}

/// Editable application detail fields. Status, admission number, and the
/// student link are never updated through this path.
#[derive(Debug, Clone, Default)]
pub struct ApplicationUpdate {
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

/// Repository for admission applications, their documents, and fee payments.
#[derive(Clone)]
pub struct ApplicationRepository {
    pool: PgPool,
}

impl ApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a DRAFT application under the given school. Used both by the
    /// authenticated path (school from the resolved scope) and the public
    /// slug-based path (school resolved from the slug).
    #[tracing::instrument(skip(self, app), fields(db.table = "applications", db.operation = "insert", school_id = %school_id))]
    pub async fn create_application(
        &self,
        school_id: Uuid,
        app: NewApplication,
    ) -> Result<Application, AppError> {
        if app.first_name.trim().is_empty() || app.last_name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "First and last name are required".to_string(),
            ));
        }

        let created = sqlx::query_as::<Postgres, Application>(&format!(
            r#"
            INSERT INTO applications (
                school_id, first_name, middle_name, last_name, gender, date_of_birth,
                nationality, guardian_name, guardian_phone, guardian_email,
                guardian_relationship, grade_level_applied, previous_school, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {APPLICATION_COLUMNS}
            "#,
        ))
        .bind(school_id)
        .bind(&app.first_name)
        .bind(&app.middle_name)
        .bind(&app.last_name)
        .bind(&app.gender)
        .bind(app.date_of_birth)
        .bind(&app.nationality)
        .bind(&app.guardian_name)
        .bind(&app.guardian_phone)
        .bind(&app.guardian_email)
        .bind(&app.guardian_relationship)
        .bind(app.grade_level_applied)
        .bind(&app.previous_school)
        .bind(&app.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// List applications visible in `scope`, newest first, optionally
    /// filtered by status. `TenantScope::None` is an empty result, not an
    /// error.
    #[tracing::instrument(skip(self), fields(db.table = "applications", db.operation = "select"))]
    pub async fn list_applications(
        &self,
        scope: TenantScope,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<Application>, AppError> {
        let apps = match scope {
            TenantScope::School(school_id) => {
                sqlx::query_as::<Postgres, Application>(&format!(
                    r#"
                    SELECT {APPLICATION_COLUMNS} FROM applications
                    WHERE school_id = $1 AND ($2::application_status IS NULL OR status = $2)
                    ORDER BY created_at DESC
                    "#,
                ))
                .bind(school_id)
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::Unscoped => {
                sqlx::query_as::<Postgres, Application>(&format!(
                    r#"
                    SELECT {APPLICATION_COLUMNS} FROM applications
                    WHERE ($1::application_status IS NULL OR status = $1)
                    ORDER BY created_at DESC
                    "#,
                ))
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::None => Vec::new(),
        };

        Ok(apps)
    }

    #[tracing::instrument(skip(self), fields(db.table = "applications", db.operation = "select", db.record_id = %id))]
    pub async fn get_application(
        &self,
        scope: TenantScope,
        id: Uuid,
    ) -> Result<Option<Application>, AppError> {
        let app = match scope {
            TenantScope::School(school_id) => {
                sqlx::query_as::<Postgres, Application>(&format!(
                    "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1 AND school_id = $2"
                ))
                .bind(id)
                .bind(school_id)
                .fetch_optional(&self.pool)
                .await?
            }
            TenantScope::Unscoped => {
                sqlx::query_as::<Postgres, Application>(&format!(
                    "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            TenantScope::None => None,
        };

        Ok(app)
    }

    /// Update detail fields. Terminal applications are immutable.
    #[tracing::instrument(skip(self, update), fields(db.table = "applications", db.operation = "update", db.record_id = %id))]
    pub async fn update_application(
        &self,
        scope: TenantScope,
        id: Uuid,
        update: ApplicationUpdate,
    ) -> Result<Application, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_application(&mut tx, scope, id).await?;
        if current.status.is_terminal() {
            return Err(AppError::InvalidInput(format!(
                "Application in status {} can no longer be edited",
                current.status
            )));
        }

        let updated = sqlx::query_as::<Postgres, Application>(&format!(
            r#"
            UPDATE applications
            SET first_name = COALESCE($2, first_name),
                middle_name = COALESCE($3, middle_name),
                last_name = COALESCE($4, last_name),
                gender = COALESCE($5, gender),
                guardian_name = COALESCE($6, guardian_name),
                guardian_phone = COALESCE($7, guardian_phone),
                guardian_email = COALESCE($8, guardian_email),
                guardian_relationship = COALESCE($9, guardian_relationship),
                grade_level_applied = COALESCE($10, grade_level_applied),
                previous_school = COALESCE($11, previous_school),
                notes = COALESCE($12, notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.middle_name)
        .bind(&update.last_name)
        .bind(&update.gender)
        .bind(&update.guardian_name)
        .bind(&update.guardian_phone)
        .bind(&update.guardian_email)
        .bind(&update.guardian_relationship)
        .bind(update.grade_level_applied)
        .bind(&update.previous_school)
        .bind(&update.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete an application. Enrolled applications stay as the audit trail
    /// behind the student record and cannot be deleted.
    #[tracing::instrument(skip(self), fields(db.table = "applications", db.operation = "delete", db.record_id = %id))]
    pub async fn delete_application(&self, scope: TenantScope, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_application(&mut tx, scope, id).await?;
        if current.status == ApplicationStatus::Enrolled {
            return Err(AppError::InvalidInput(
                "Enrolled applications cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Move an application along the workflow graph.
    ///
    /// The ENROLLED edge is owned by the enrollment transaction and is
    /// rejected here even though the graph admits it. The submission
    /// timestamp is stamped exactly once, on DRAFT -> SUBMITTED.
    #[tracing::instrument(skip(self), fields(db.table = "applications", db.operation = "update", db.record_id = %id, target = %target))]
    pub async fn transition_status(
        &self,
        scope: TenantScope,
        id: Uuid,
        target: ApplicationStatus,
    ) -> Result<Application, AppError> {
        if target == ApplicationStatus::Enrolled {
            return Err(AppError::InvalidInput(
                "Use the enroll operation to enroll an accepted application".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let current = Self::lock_application(&mut tx, scope, id).await?;
        workflow::validate_transition(current.status, target)?;

        let stamp_submitted = workflow::stamps_submitted_at(current.status, target);

        let updated = sqlx::query_as::<Postgres, Application>(&format!(
            r#"
            UPDATE applications
            SET status = $2,
                submitted_at = CASE WHEN $3 THEN COALESCE(submitted_at, NOW()) ELSE submitted_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(target)
        .bind(stamp_submitted)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            application_id = %id,
            from = %current.status,
            to = %target,
            "Application status transition"
        );

        Ok(updated)
    }

    /// Assign an admission number to an application. Idempotent: an
    /// application that already has one keeps it. Returns `None` for schools
    /// with CUSTOM numbering.
    #[tracing::instrument(skip(self), fields(db.table = "applications", db.operation = "update", db.record_id = %id))]
    pub async fn assign_admission_number(
        &self,
        scope: TenantScope,
        id: Uuid,
    ) -> Result<Option<String>, AppError> {
        let mut last_school_id = None;

        // Retries only matter when a generated number collides with a
        // hand-entered one outside the counter series.
        for _ in 0..MAX_ASSIGN_ATTEMPTS {
            let mut tx = self.pool.begin().await?;

            let app = Self::lock_application(&mut tx, scope, id).await?;
            if let Some(existing) = app.admission_number {
                return Ok(Some(existing));
            }
            last_school_id = Some(app.school_id);

            let school = Self::get_school_in_tx(&mut tx, app.school_id).await?;
            // Same year source as enrollment: the submission year pins the
            // application to one series; drafts fall back to the current year.
            let year = app
                .submitted_at
                .map(|t| t.year())
                .unwrap_or_else(|| Utc::now().year());

            let Some(number) = AdmissionNumberGenerator::next_in_tx(&mut tx, &school, year).await?
            else {
                return Ok(None);
            };

            let result = sqlx::query("UPDATE applications SET admission_number = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(&number)
                .execute(&mut *tx)
                .await;

            match result {
                Ok(_) => {
                    tx.commit().await?;
                    return Ok(Some(number));
                }
                Err(err) if super::is_unique_violation(&err) => {
                    tx.rollback().await?;
                    tracing::warn!(application_id = %id, number = %number, "Admission number collision, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(AppError::DuplicateIdentifier {
            school_id: last_school_id.unwrap_or(Uuid::nil()),
        })
    }

    /// Set a manually chosen admission number (CUSTOM schools). Rejects
    /// duplicates within the school. Once a number is assigned it is never
    /// reassigned; re-sending the same value is a no-op.
    #[tracing::instrument(skip(self), fields(db.table = "applications", db.operation = "update", db.record_id = %id))]
    pub async fn set_custom_admission_number(
        &self,
        scope: TenantScope,
        id: Uuid,
        number: &str,
    ) -> Result<Application, AppError> {
        if number.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Admission number cannot be empty".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let current = Self::lock_application(&mut tx, scope, id).await?;

        if let Some(existing) = &current.admission_number {
            if existing == number {
                return Ok(current);
            }
            return Err(AppError::InvalidInput(format!(
                "Application already holds admission number '{}' and it cannot be changed",
                existing
            )));
        }

        let updated = sqlx::query_as::<Postgres, Application>(&format!(
            r#"
            UPDATE applications
            SET admission_number = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(number)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if super::is_unique_violation(&err) {
                AppError::InvalidInput(format!(
                    "Admission number '{}' is already in use at this school",
                    number
                ))
            } else {
                err.into()
            }
        })?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Attach a document, deduplicated by SHA-256 content checksum within the
    /// application. Re-uploading identical content returns the existing row.
    #[tracing::instrument(skip(self, content), fields(db.table = "application_documents", db.operation = "insert", application_id = %application_id))]
    pub async fn attach_document(
        &self,
        scope: TenantScope,
        application_id: Uuid,
        file_name: &str,
        content_type: Option<&str>,
        content: &[u8],
    ) -> Result<ApplicationDocument, AppError> {
        // Tenant check before touching the child table.
        self.get_application(scope, application_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

        let checksum = document_checksum(content);

        let doc = sqlx::query_as::<Postgres, ApplicationDocument>(
            r#"
            INSERT INTO application_documents (application_id, file_name, content_type, size_bytes, checksum)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (application_id, checksum) WHERE checksum IS NOT NULL DO NOTHING
            RETURNING id, application_id, file_name, content_type, size_bytes, checksum, uploaded_at
            "#,
        )
        .bind(application_id)
        .bind(file_name)
        .bind(content_type)
        .bind(content.len() as i64)
        .bind(&checksum)
        .fetch_optional(&self.pool)
        .await?;

        match doc {
            Some(doc) => Ok(doc),
            // Conflict path: the identical document already exists.
            None => {
                let existing = sqlx::query_as::<Postgres, ApplicationDocument>(
                    r#"
                    SELECT id, application_id, file_name, content_type, size_bytes, checksum, uploaded_at
                    FROM application_documents
                    WHERE application_id = $1 AND checksum = $2
                    "#,
                )
                .bind(application_id)
                .bind(&checksum)
                .fetch_one(&self.pool)
                .await?;
                Ok(existing)
            }
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "application_documents", db.operation = "select", application_id = %application_id))]
    pub async fn list_documents(
        &self,
        scope: TenantScope,
        application_id: Uuid,
    ) -> Result<Vec<ApplicationDocument>, AppError> {
        self.get_application(scope, application_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

        let docs = sqlx::query_as::<Postgres, ApplicationDocument>(
            r#"
            SELECT id, application_id, file_name, content_type, size_bytes, checksum, uploaded_at
            FROM application_documents
            WHERE application_id = $1
            ORDER BY uploaded_at ASC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(docs)
    }

    /// Backfill checksums for documents stored before hashing was
    /// introduced. The caller streams each document's content from blob
    /// storage; rows that already carry a checksum are skipped.
    #[tracing::instrument(skip(self, content), fields(db.table = "application_documents", db.operation = "update", db.record_id = %document_id))]
    pub async fn backfill_document_checksum(
        &self,
        document_id: Uuid,
        content: &[u8],
    ) -> Result<bool, AppError> {
        let checksum = document_checksum(content);

        let result = sqlx::query(
            "UPDATE application_documents SET checksum = $2 WHERE id = $1 AND checksum IS NULL",
        )
        .bind(document_id)
        .bind(&checksum)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a fee payment against an application. Payments are bookkeeping
    /// only; enrollment never checks them.
    #[tracing::instrument(skip(self), fields(db.table = "application_fee_payments", db.operation = "insert", application_id = %application_id))]
    pub async fn record_fee_payment(
        &self,
        scope: TenantScope,
        application_id: Uuid,
        amount: Decimal,
        payment_method: &str,
        receipt_number: Option<&str>,
    ) -> Result<ApplicationFeePayment, AppError> {
        if amount <= Decimal::ZERO {
            return Err(AppError::InvalidInput(
                "Payment amount must be positive".to_string(),
            ));
        }

        self.get_application(scope, application_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

        let payment = sqlx::query_as::<Postgres, ApplicationFeePayment>(
            r#"
            INSERT INTO application_fee_payments (application_id, amount, payment_method, receipt_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id, application_id, amount, payment_method, receipt_number, paid_at
            "#,
        )
        .bind(application_id)
        .bind(amount)
        .bind(payment_method)
        .bind(receipt_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }

    #[tracing::instrument(skip(self), fields(db.table = "application_fee_payments", db.operation = "select", application_id = %application_id))]
    pub async fn list_fee_payments(
        &self,
        scope: TenantScope,
        application_id: Uuid,
    ) -> Result<Vec<ApplicationFeePayment>, AppError> {
        self.get_application(scope, application_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;

        let payments = sqlx::query_as::<Postgres, ApplicationFeePayment>(
            r#"
            SELECT id, application_id, amount, payment_method, receipt_number, paid_at
            FROM application_fee_payments
            WHERE application_id = $1
            ORDER BY paid_at ASC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Lock an application row for update, enforcing the tenant filter in
    /// the same statement. Shared by every multi-step write.
    pub(crate) async fn lock_application(
        tx: &mut Transaction<'_, Postgres>,
        scope: TenantScope,
        id: Uuid,
    ) -> Result<Application, AppError> {
        let app = match scope {
            TenantScope::School(school_id) => {
                sqlx::query_as::<Postgres, Application>(&format!(
                    "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1 AND school_id = $2 FOR UPDATE"
                ))
                .bind(id)
                .bind(school_id)
                .fetch_optional(&mut **tx)
                .await?
            }
            TenantScope::Unscoped => {
                sqlx::query_as::<Postgres, Application>(&format!(
                    "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1 FOR UPDATE"
                ))
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?
            }
            TenantScope::None => None,
        };

        app.ok_or_else(|| AppError::NotFound("Application not found".to_string()))
    }

    pub(crate) async fn get_school_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        school_id: Uuid,
    ) -> Result<School, AppError> {
        let school = sqlx::query_as::<Postgres, School>(
            r#"
            SELECT id, name, short_name, slug, email, phone, address, city, country, currency,
                   admission_number_format, admission_prefix, admission_seq_padding,
                   enabled_modules, owner_user_id, created_at, updated_at
            FROM schools WHERE id = $1
            "#,
        )
        .bind(school_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;

        Ok(school)
    }
}

/// SHA-256 hex digest of document content.
pub fn document_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
