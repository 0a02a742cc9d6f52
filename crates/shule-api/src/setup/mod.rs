//! Application setup and initialization.

pub mod database;
pub mod routes;
pub mod server;

use anyhow::Result;
use shule_core::Config;
use std::sync::Arc;

use crate::state::AppState;

/// Initialize the entire application: telemetry, database, state, routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry();

    tracing::info!(environment = %config.environment, "Configuration loaded");

    let pool = database::setup_database(&config).await?;

    let state = Arc::new(AppState::new(config.clone(), pool));

    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
