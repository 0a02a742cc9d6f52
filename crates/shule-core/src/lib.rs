//! Shule Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! pure tenant/admission logic shared across all Shule components: tenant
//! context resolution, the admission workflow state graph, and
//! admission-number formatting. It performs no I/O.

pub mod admission_number;
pub mod config;
pub mod error;
pub mod models;
pub mod tenant;
pub mod workflow;

// Re-export commonly used types
pub use admission_number::{format_admission_number, AdmissionNumberSpec};
pub use config::Config;
pub use error::{AppError, EnrollmentFailure, ErrorMetadata, LogLevel};
pub use tenant::{resolve_tenant, AccessKind, Principal, TenantScope};
pub use workflow::validate_transition;
