//! Enrollment: the single transaction that turns an ACCEPTED application
//! into a student.
//!
//! Everything happens under one row lock: precondition checks, admission
//! number allocation, student creation, and the application's move to
//! ENROLLED. Re-enrolling an already-ENROLLED application is idempotent and
//! returns the existing student. Fee payments are never a precondition.

use chrono::{Datelike, Utc};
use shule_core::{
    models::ApplicationStatus, AppError, EnrollmentFailure, TenantScope,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::admission_numbers::AdmissionNumberGenerator;
use super::applications::ApplicationRepository;

const MAX_ENROLL_ATTEMPTS: u32 = 5;

/// What an enroll call produced. `created` is false on the idempotent
/// re-enroll path.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EnrollmentOutcome {
    pub student_id: Uuid,
    pub admission_number: String,
    pub created: bool,
}

#[derive(Clone)]
pub struct EnrollmentService {
    pool: PgPool,
}

impl EnrollmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enroll an accepted application.
    ///
    /// `exam_number` is optional and only accepted when the applied grade
    /// level sits an exam; pre-primary levels must enroll without one.
    #[tracing::instrument(skip(self), fields(db.table = "applications", db.operation = "enroll", db.record_id = %application_id))]
    pub async fn enroll(
        &self,
        scope: TenantScope,
        application_id: Uuid,
        exam_number: Option<String>,
    ) -> Result<EnrollmentOutcome, AppError> {
        let mut last_school_id = Uuid::nil();

        for _ in 0..MAX_ENROLL_ATTEMPTS {
            let mut tx = self.pool.begin().await?;

            // Lock without a tenant filter so a cross-tenant attempt is
            // reported as a wrong-tenant precondition, not a 404.
            let app =
                ApplicationRepository::lock_application(&mut tx, TenantScope::Unscoped, application_id)
                    .await?;

            match scope {
                TenantScope::School(school_id) if school_id != app.school_id => {
                    return Err(AppError::InvalidEnrollment {
                        reason: EnrollmentFailure::WrongTenant,
                    });
                }
                TenantScope::None => {
                    return Err(AppError::NoTenantFound(
                        "Enrollment requires a school context".to_string(),
                    ));
                }
                _ => {}
            }

            // Idempotent path: already enrolled, hand back the student.
            if app.status == ApplicationStatus::Enrolled {
                if let Some(student_id) = app.student_id {
                    let admission_number = sqlx::query_scalar::<Postgres, String>(
                        "SELECT admission_number FROM students WHERE id = $1",
                    )
                    .bind(student_id)
                    .fetch_one(&mut *tx)
                    .await?;

                    return Ok(EnrollmentOutcome {
                        student_id,
                        admission_number,
                        created: false,
                    });
                }
                // ENROLLED with no student is unreachable through this
                // service; treat it as a conflict rather than re-creating.
                return Err(AppError::InvalidEnrollment {
                    reason: EnrollmentFailure::AlreadyEnrolled,
                });
            }

            if app.student_id.is_some() {
                return Err(AppError::InvalidEnrollment {
                    reason: EnrollmentFailure::AlreadyEnrolled,
                });
            }

            if app.status != ApplicationStatus::Accepted {
                return Err(AppError::InvalidEnrollment {
                    reason: EnrollmentFailure::WrongStatus,
                });
            }

            last_school_id = app.school_id;
            let school = ApplicationRepository::get_school_in_tx(&mut tx, app.school_id).await?;

            // Exam-number gating on the applied grade's education level.
            if exam_number.is_some() {
                let education_level: Option<String> = match app.grade_level_applied {
                    Some(grade_id) => sqlx::query_scalar::<Postgres, Option<String>>(
                        "SELECT education_level FROM grade_levels WHERE id = $1",
                    )
                    .bind(grade_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .flatten(),
                    None => None,
                };

                if !shule_core::models::is_exam_level(education_level.as_deref()) {
                    return Err(AppError::InvalidInput(
                        "Students at this education level do not carry an exam number".to_string(),
                    ));
                }
            }

            let year = app
                .submitted_at
                .map(|t| t.year())
                .unwrap_or_else(|| Utc::now().year());

            let (admission_number, generated) = match &app.admission_number {
                Some(number) => (number.clone(), false),
                None => {
                    match AdmissionNumberGenerator::next_in_tx(&mut tx, &school, year).await? {
                        Some(number) => (number, true),
                        None => {
                            return Err(AppError::InvalidInput(
                                "This school uses custom admission numbers; assign one before enrolling"
                                    .to_string(),
                            ));
                        }
                    }
                }
            };

            let insert = sqlx::query_scalar::<Postgres, Uuid>(
                r#"
                INSERT INTO students (
                    school_id, admission_number, first_name, middle_name, last_name,
                    gender, date_of_birth, grade_level_id, emergency_contact_name,
                    emergency_contact_phone, exam_number, application_id
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING id
                "#,
            )
            .bind(app.school_id)
            .bind(&admission_number)
            .bind(&app.first_name)
            .bind(&app.middle_name)
            .bind(&app.last_name)
            .bind(&app.gender)
            .bind(app.date_of_birth)
            .bind(app.grade_level_applied)
            .bind(&app.guardian_name)
            .bind(&app.guardian_phone)
            .bind(&exam_number)
            .bind(app.id)
            .fetch_one(&mut *tx)
            .await;

            let student_id = match insert {
                Ok(id) => id,
                Err(err) if super::is_unique_violation(&err) && generated => {
                    // A hand-entered student number landed on the generated
                    // value; roll back and take a fresh sequence value.
                    tx.rollback().await?;
                    tracing::warn!(application_id = %app.id, number = %admission_number, "Admission number collision during enrollment, retrying");
                    continue;
                }
                Err(err) if super::is_unique_violation(&err) => {
                    return Err(AppError::InvalidInput(format!(
                        "Admission number '{}' is already in use at this school",
                        admission_number
                    )));
                }
                Err(err) => return Err(err.into()),
            };

            sqlx::query(
                r#"
                UPDATE applications
                SET status = 'ENROLLED', student_id = $2, admission_number = $3, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(app.id)
            .bind(student_id)
            .bind(&admission_number)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;

            tracing::info!(
                application_id = %app.id,
                student_id = %student_id,
                student_name = %app.full_name(),
                admission_number = %admission_number,
                "Application enrolled"
            );

            return Ok(EnrollmentOutcome {
                student_id,
                admission_number,
                created: true,
            });
        }

        Err(AppError::DuplicateIdentifier {
            school_id: last_school_id,
        })
    }
}
