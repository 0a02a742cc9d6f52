use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use shule_core::{AppError, Principal};
use shule_db::UserRepository;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::models::{AuthContext, JwtClaims};
use crate::constants::SCHOOL_HINT_HEADER;
use crate::error::HttpAppError;

#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
    pub user_repository: UserRepository,
}

/// Bearer-token auth. On success inserts an [`AuthContext`] (principal with
/// memberships loaded, plus the X-School-Id hint) into request extensions.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };

    let claims = match decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(auth_state.jwt_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => data.claims,
        Err(err) => {
            tracing::debug!(error = %err, "Token validation failed");
            return HttpAppError(AppError::Unauthorized(
                "Invalid or expired token".to_string(),
            ))
            .into_response();
        }
    };

    let user = match auth_state.user_repository.get_user(claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpAppError(AppError::Unauthorized("Unknown user".to_string()))
                .into_response();
        }
        Err(err) => return HttpAppError(err).into_response(),
    };

    let school_ids = match auth_state
        .user_repository
        .list_school_ids_for_user(user.id)
        .await
    {
        Ok(ids) => ids,
        Err(err) => return HttpAppError(err).into_response(),
    };

    let school_hint = match parse_school_hint(&request) {
        Ok(hint) => hint,
        Err(err) => return HttpAppError(err).into_response(),
    };

    let context = AuthContext {
        principal: Principal {
            user_id: user.id,
            is_superuser: user.is_superuser,
            school_ids,
        },
        school_hint,
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}

fn parse_school_hint(request: &Request) -> Result<Option<Uuid>, AppError> {
    let Some(raw) = request
        .headers()
        .get(SCHOOL_HINT_HEADER)
        .and_then(|h| h.to_str().ok())
    else {
        return Ok(None);
    };

    raw.parse::<Uuid>().map(Some).map_err(|_| {
        AppError::InvalidInput(format!(
            "Invalid {} header: expected a UUID",
            SCHOOL_HINT_HEADER
        ))
    })
}
