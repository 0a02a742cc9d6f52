use shule_core::{models::User, AppError};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Repository for user accounts and their school memberships.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            "SELECT id, email, is_superuser, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "insert"))]
    pub async fn create_user(
        &self,
        email: &str,
        is_superuser: bool,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (email, is_superuser)
            VALUES ($1, $2)
            RETURNING id, email, is_superuser, created_at
            "#,
        )
        .bind(email)
        .bind(is_superuser)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Schools the user owns or is a member of. Feeds `Principal::school_ids`
    /// for tenant resolution.
    #[tracing::instrument(skip(self), fields(db.table = "school_members", db.operation = "select"))]
    pub async fn list_school_ids_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        let ids = sqlx::query_scalar::<Postgres, Uuid>(
            r#"
            SELECT school_id FROM school_members WHERE user_id = $1
            UNION
            SELECT id FROM schools WHERE owner_user_id = $1
            ORDER BY 1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
