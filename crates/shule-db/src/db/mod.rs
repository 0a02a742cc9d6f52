pub mod academics;
pub mod admission_numbers;
pub mod applications;
pub mod enrollment;
pub mod schools;
pub mod students;
pub mod templates;
pub mod users;

/// True when the error is a Postgres unique-constraint violation (23505).
/// Used by write paths that race on partial unique indexes and retry.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
