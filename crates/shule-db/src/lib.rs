//! Database layer: repositories, the admission-number generator, and the
//! enrollment service. Every tenant-scoped query takes an explicit
//! [`shule_core::TenantScope`]; no query infers its tenant from ambient state.

pub mod db;

pub use db::academics::AcademicsRepository;
pub use db::admission_numbers::AdmissionNumberGenerator;
pub use db::applications::ApplicationRepository;
pub use db::enrollment::{EnrollmentOutcome, EnrollmentService};
pub use db::schools::SchoolRepository;
pub use db::students::StudentRepository;
pub use db::templates::TemplateRepository;
pub use db::users::UserRepository;
