use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use shule_core::{resolve_tenant, AccessKind, AppError, Principal, TenantScope};
use uuid::Uuid;

use crate::error::ErrorResponse;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid, // user_id
    pub exp: i64,  // expiration timestamp
    pub iat: i64,  // issued at timestamp
}

/// Authenticated caller plus their optional school selection, stored in
/// request extensions by the auth middleware. Tenant resolution is deferred
/// to the handler so the access kind (read vs write) is known.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub principal: Principal,
    /// Parsed X-School-Id header, if sent.
    pub school_hint: Option<Uuid>,
}

impl AuthContext {
    pub fn read_scope(&self) -> Result<TenantScope, AppError> {
        resolve_tenant(&self.principal, self.school_hint, AccessKind::Read)
    }

    pub fn write_scope(&self) -> Result<TenantScope, AppError> {
        resolve_tenant(&self.principal, self.school_hint, AccessKind::Write)
    }

    pub fn user_id(&self) -> Uuid {
        self.principal.user_id
    }

    pub fn require_superuser(&self) -> Result<(), AppError> {
        if self.principal.is_superuser {
            Ok(())
        } else {
            Err(AppError::AccessDenied(
                "This operation requires administrator access".to_string(),
            ))
        }
    }
}

// FromRequestParts so handlers can take AuthContext directly as an argument.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new(
                        "Missing authentication context",
                        "MISSING_AUTH_CONTEXT",
                    )),
                )
            })
    }
}
