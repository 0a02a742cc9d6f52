//! Auth helpers: users and bearer tokens.

use shule_api::auth::create_token;
use shule_db::UserRepository;
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Create a user and return its id.
pub async fn create_user(pool: &PgPool, email: &str, is_superuser: bool) -> Uuid {
    UserRepository::new(pool.clone())
        .create_user(email, is_superuser)
        .await
        .expect("Failed to create test user")
        .id
}

/// Bearer token value (without the "Bearer " prefix) for a user.
pub fn token_for(user_id: Uuid) -> String {
    create_token(TEST_JWT_SECRET, user_id, 24).expect("Failed to sign test token")
}
