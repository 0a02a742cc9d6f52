//! Domain models shared across the Shule crates.

pub mod academics;
pub mod application;
pub mod school;
pub mod student;
pub mod user;

pub use academics::{
    is_exam_level, CopyCounts, CopyReport, Curriculum, Department, GradeLevel, NO_EXAM_LEVELS,
};
pub use application::{
    Application, ApplicationDocument, ApplicationFeePayment, ApplicationStatus,
};
pub use school::{AdmissionNumberFormat, School, SchoolStatusCounts};
pub use student::{Student, StudentStatus};
pub use user::User;
