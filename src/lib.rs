// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod factors;
pub mod jitter;
pub mod metrics;
pub mod prediction;
pub mod request;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::engine::PriceEngine;
pub use crate::error::{FallbackUsed, ValidationError};
pub use crate::factors::FactorTables;
pub use crate::prediction::{Prediction, PredictionResult};
pub use crate::request::PredictionRequest;

use axum::Router;
use tracing::info;

use crate::config::EnrichmentConfig;
use crate::metrics::Metrics;

/// Build the full in-process app from the environment:
/// factor tables (`FACTOR_TABLES_PATH` or `config/factor_tables.toml`, else built-in),
/// enrichment (`ENRICH_*`), and the `/metrics` route.
pub async fn app() -> anyhow::Result<Router> {
    let tables = FactorTables::load()?;
    let enrich = EnrichmentConfig::from_env();
    info!(
        crops = tables.crops().len(),
        enrich_enabled = enrich.enabled,
        enrich_mode = ?enrich.mode,
        "building crop price service"
    );

    let state = AppState::new(PriceEngine::new(tables), &enrich);
    let metrics = Metrics::init()?;
    Ok(router(state).merge(metrics.router()))
}
