use shule_core::{
    models::{Student, StudentStatus},
    AppError, TenantScope,
};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const STUDENT_COLUMNS: &str = "id, school_id, admission_number, first_name, middle_name, \
     last_name, gender, date_of_birth, grade_level_id, emergency_contact_name, \
     emergency_contact_phone, exam_number, status, application_id, created_at, updated_at";

/// Repository for enrolled students. Creation happens exclusively through
/// the enrollment service; this repository reads and maintains existing rows.
#[derive(Clone)]
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "students", db.operation = "select"))]
    pub async fn list_students(
        &self,
        scope: TenantScope,
        status: Option<StudentStatus>,
    ) -> Result<Vec<Student>, AppError> {
        let students = match scope {
            TenantScope::School(school_id) => {
                sqlx::query_as::<Postgres, Student>(&format!(
                    r#"
                    SELECT {STUDENT_COLUMNS} FROM students
                    WHERE school_id = $1 AND ($2::student_status IS NULL OR status = $2)
                    ORDER BY admission_number ASC
                    "#,
                ))
                .bind(school_id)
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::Unscoped => {
                sqlx::query_as::<Postgres, Student>(&format!(
                    r#"
                    SELECT {STUDENT_COLUMNS} FROM students
                    WHERE ($1::student_status IS NULL OR status = $1)
                    ORDER BY admission_number ASC
                    "#,
                ))
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            TenantScope::None => Vec::new(),
        };

        Ok(students)
    }

    #[tracing::instrument(skip(self), fields(db.table = "students", db.operation = "select", db.record_id = %id))]
    pub async fn get_student(
        &self,
        scope: TenantScope,
        id: Uuid,
    ) -> Result<Option<Student>, AppError> {
        let student = match scope {
            TenantScope::School(school_id) => {
                sqlx::query_as::<Postgres, Student>(&format!(
                    "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1 AND school_id = $2"
                ))
                .bind(id)
                .bind(school_id)
                .fetch_optional(&self.pool)
                .await?
            }
            TenantScope::Unscoped => {
                sqlx::query_as::<Postgres, Student>(&format!(
                    "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            TenantScope::None => None,
        };

        Ok(student)
    }

    /// Look a student up by admission number within a school.
    #[tracing::instrument(skip(self), fields(db.table = "students", db.operation = "select"))]
    pub async fn get_by_admission_number(
        &self,
        school_id: Uuid,
        admission_number: &str,
    ) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<Postgres, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE school_id = $1 AND admission_number = $2"
        ))
        .bind(school_id)
        .bind(admission_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    #[tracing::instrument(skip(self), fields(db.table = "students", db.operation = "update", db.record_id = %id))]
    pub async fn set_status(
        &self,
        scope: TenantScope,
        id: Uuid,
        status: StudentStatus,
    ) -> Result<Student, AppError> {
        let student = match scope {
            TenantScope::School(school_id) => {
                sqlx::query_as::<Postgres, Student>(&format!(
                    r#"
                    UPDATE students SET status = $3, updated_at = NOW()
                    WHERE id = $1 AND school_id = $2
                    RETURNING {STUDENT_COLUMNS}
                    "#,
                ))
                .bind(id)
                .bind(school_id)
                .bind(status)
                .fetch_optional(&self.pool)
                .await?
            }
            TenantScope::Unscoped => {
                sqlx::query_as::<Postgres, Student>(&format!(
                    r#"
                    UPDATE students SET status = $2, updated_at = NOW()
                    WHERE id = $1
                    RETURNING {STUDENT_COLUMNS}
                    "#,
                ))
                .bind(id)
                .bind(status)
                .fetch_optional(&self.pool)
                .await?
            }
            TenantScope::None => None,
        };

        student.ok_or_else(|| AppError::NotFound("Student not found".to_string()))
    }
}
