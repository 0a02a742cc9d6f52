pub mod middleware;
pub mod models;

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use shule_core::AppError;
use uuid::Uuid;

use models::JwtClaims;

/// Issue an HS256 token for a user. Used by operator tooling and tests;
/// there is no interactive login flow in this service.
pub fn create_token(secret: &str, user_id: Uuid, expiry_hours: i64) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = JwtClaims {
        sub: user_id,
        iat: now,
        exp: now + expiry_hours * 3600,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|err| AppError::Internal(format!("Failed to sign token: {}", err)))
}
