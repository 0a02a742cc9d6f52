//! Sequential admission-number allocation.
//!
//! Sequence state lives in the `admission_sequences` counter table, keyed by
//! (school, year, prefix). Advancing the counter is a single
//! `INSERT ... ON CONFLICT DO UPDATE ... RETURNING` so concurrent
//! transactions serialize on the row and each caller observes a distinct
//! value. The counter is seeded from the highest trailing sequence already in
//! use, so legacy or hand-entered numbers are never re-issued.

use shule_core::{format_admission_number, models::School, AdmissionNumberSpec, AppError};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Allocates formatted admission numbers inside a caller-supplied
/// transaction. Stateless; all state is in the database.
pub struct AdmissionNumberGenerator;

impl AdmissionNumberGenerator {
    /// Allocate the next admission number for `school` in `year`, or `None`
    /// when the school uses CUSTOM numbering (caller supplies the value).
    ///
    /// Runs inside the caller's transaction: if the enclosing work rolls
    /// back, the counter advance rolls back with it.
    #[tracing::instrument(skip(tx, school), fields(db.table = "admission_sequences", db.operation = "upsert", school_id = %school.id))]
    pub async fn next_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        school: &School,
        year: i32,
    ) -> Result<Option<String>, AppError> {
        let spec = AdmissionNumberSpec::new(
            school.admission_number_format,
            &school.admission_prefix,
            school.admission_seq_padding,
        );

        // CUSTOM is manual entry; the generator must never assign.
        if format_admission_number(&spec, year, 1).is_none() {
            return Ok(None);
        }

        let prefix = spec.sequence_prefix().to_string();
        let seed = Self::highest_existing_seq(tx, school.id, &prefix, year).await?;

        // GREATEST folds the seed in even when the counter row already
        // exists, so numbers assigned outside the counter cannot collide.
        let seq = sqlx::query_scalar::<Postgres, i64>(
            r#"
            INSERT INTO admission_sequences (school_id, year, prefix, last_seq)
            VALUES ($1, $2, $3, $4 + 1)
            ON CONFLICT (school_id, year, prefix)
            DO UPDATE SET last_seq = GREATEST(admission_sequences.last_seq, $4) + 1
            RETURNING last_seq
            "#,
        )
        .bind(school.id)
        .bind(year)
        .bind(&prefix)
        .bind(seed)
        .fetch_one(&mut **tx)
        .await?;

        Ok(format_admission_number(&spec, year, seq))
    }

    /// Highest trailing sequence already assigned in this (school, prefix,
    /// year) series, across both applications and students. Zero when the
    /// series is empty.
    async fn highest_existing_seq(
        tx: &mut Transaction<'_, Postgres>,
        school_id: Uuid,
        prefix: &str,
        year: i32,
    ) -> Result<i64, AppError> {
        let pattern = format!("{}{}-%", escape_like(prefix), year);

        let max = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT COALESCE(MAX(seq), 0) FROM (
                SELECT NULLIF(substring(admission_number FROM '([0-9]+)$'), '')::bigint AS seq
                FROM applications
                WHERE school_id = $1 AND admission_number LIKE $2
                UNION ALL
                SELECT NULLIF(substring(admission_number FROM '([0-9]+)$'), '')::bigint
                FROM students
                WHERE school_id = $1 AND admission_number LIKE $2
            ) AS existing
            "#,
        )
        .bind(school_id)
        .bind(&pattern)
        .fetch_one(&mut **tx)
        .await?;

        Ok(max)
    }
}

/// Escape LIKE metacharacters so a configured prefix matches literally.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
