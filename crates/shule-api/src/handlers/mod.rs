pub mod academics;
pub mod applications;
pub mod public;
pub mod schools;
pub mod students;
