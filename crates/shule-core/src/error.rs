//! Error types module
//!
//! All errors are unified under the `AppError` enum: database failures,
//! tenant-scoping violations, workflow violations, and input errors.
//! `ErrorMetadata` lets each variant self-describe its HTTP response
//! characteristics so the API layer stays a thin mapping.

use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "ACCESS_DENIED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Specific reason an enrollment precondition failed.
///
/// Surfaced verbatim to the caller: enrollment failures must never be a
/// generic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentFailure {
    /// Application status is not ACCEPTED (and not the idempotent ENROLLED path)
    WrongStatus,
    /// A student record is already linked but status never reached ENROLLED
    AlreadyEnrolled,
    /// Caller's tenant scope does not match the application's school
    WrongTenant,
}

impl std::fmt::Display for EnrollmentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrollmentFailure::WrongStatus => {
                write!(f, "only ACCEPTED applications can be enrolled")
            }
            EnrollmentFailure::AlreadyEnrolled => write!(f, "application is already enrolled"),
            EnrollmentFailure::WrongTenant => {
                write!(f, "application belongs to a different school")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("No school context could be resolved: {0}")]
    NoTenantFound(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Enrollment rejected: {reason}")]
    InvalidEnrollment { reason: EnrollmentFailure },

    #[error("Admission number generation exhausted retries for school {school_id}")]
    DuplicateIdentifier { school_id: uuid::Uuid },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable,
/// suggested_action, sensitive, log_level). client_message stays per-variant
/// for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::AccessDenied(_) => (
            403,
            "ACCESS_DENIED",
            false,
            Some("Check that you are a member of the requested school"),
            false,
            LogLevel::Warn,
        ),
        AppError::NoTenantFound(_) => (
            400,
            "NO_TENANT_FOUND",
            false,
            Some("Supply an X-School-Id header or join a school first"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidTransition { .. } => (
            409,
            "INVALID_TRANSITION",
            false,
            Some("Check the application's current status"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidEnrollment { .. } => (
            409,
            "INVALID_ENROLLMENT",
            false,
            Some("Check the application's status and school"),
            false,
            LogLevel::Debug,
        ),
        AppError::DuplicateIdentifier { .. } => (
            500,
            "DUPLICATE_IDENTIFIER",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Check authentication token"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::AccessDenied(_) => "AccessDenied",
            AppError::NoTenantFound(_) => "NoTenantFound",
            AppError::InvalidTransition { .. } => "InvalidTransition",
            AppError::InvalidEnrollment { .. } => "InvalidEnrollment",
            AppError::DuplicateIdentifier { .. } => "DuplicateIdentifier",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::AccessDenied(ref msg) => msg.clone(),
            AppError::NoTenantFound(ref msg) => msg.clone(),
            AppError::InvalidTransition { from, to } => {
                format!("Cannot move application from {} to {}", from, to)
            }
            AppError::InvalidEnrollment { reason } => format!("Enrollment rejected: {}", reason),
            AppError::DuplicateIdentifier { .. } => {
                "Failed to allocate a unique admission number".to_string()
            }
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}
