//! Shule API Library
//!
//! HTTP handlers, auth middleware, and application setup for the school
//! management service.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod telemetry;

pub mod auth;
pub mod error;
pub mod state;

pub use error::ErrorResponse;
