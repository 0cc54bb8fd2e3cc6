//! HTTP boundary: routes, shared state, error mapping.
//!
//! - `GET  /`                 service banner
//! - `GET  /health`           liveness probe
//! - `POST /predict`          deterministic prediction (+ advisory enrichment headers)
//! - `POST /predict/explain`  prediction with the full factor breakdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::EnrichmentConfig;
use crate::engine::PriceEngine;
use crate::enrich::{self, DynEnricher, EnrichOutcome};
use crate::error::{FieldError, ValidationError};
use crate::metrics;
use crate::prediction::{Prediction, PredictionResult, PriceBreakdown};
use crate::request::PredictionRequest;

pub const SERVICE_NAME: &str = "crop-price-engine";

const HDR_FALLBACK: HeaderName = HeaderName::from_static("x-price-fallback");
const HDR_ENRICH_USED: HeaderName = HeaderName::from_static("x-enrich-used");
const HDR_ENRICH_REASON: HeaderName = HeaderName::from_static("x-enrich-reason");

#[derive(Clone)]
pub struct AppState {
    pub engine: PriceEngine,
    pub enricher: DynEnricher,
    pub enrich_enabled: bool,
    pub enrich_timeout: Duration,
}

impl AppState {
    pub fn new(engine: PriceEngine, cfg: &EnrichmentConfig) -> Self {
        Self {
            engine,
            enricher: enrich::build_enricher(cfg),
            enrich_enabled: cfg.enabled,
            enrich_timeout: cfg.timeout,
        }
    }

    /// Engine over the given tables, enrichment disabled.
    pub fn offline(engine: PriceEngine) -> Self {
        Self::new(engine, &EnrichmentConfig::default())
    }

    pub fn with_enricher(mut self, enricher: DynEnricher, timeout: Duration) -> Self {
        self.enricher = enricher;
        self.enrich_enabled = true;
        self.enrich_timeout = timeout;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/predict/explain", post(predict_explain))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/* ----------------------------
Errors
---------------------------- */

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody {
                    error: "validation_error",
                    message,
                    fields: e.fields,
                }),
            )
                .into_response(),
            ApiError::MalformedBody(_) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "malformed_body",
                    message,
                    fields: Vec::new(),
                }),
            )
                .into_response(),
        }
    }
}

/* ----------------------------
Handlers
---------------------------- */

async fn root() -> Json<Value> {
    Json(json!({ "message": "Crop Price Prediction API", "status": "running" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

#[derive(Serialize)]
struct ExplainResp {
    result: PredictionResult,
    breakdown: PriceBreakdown,
    enrichment: EnrichOutcome,
}

async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let (req, prediction) = run_prediction(&state, body)?;
    let outcome = run_enrichment(&state, &req).await;
    let headers = diagnostic_headers(&prediction, &outcome);
    Ok((headers, Json(prediction.result)).into_response())
}

async fn predict_explain(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
    let (req, prediction) = run_prediction(&state, body)?;
    let outcome = run_enrichment(&state, &req).await;
    let headers = diagnostic_headers(&prediction, &outcome);
    let Prediction { result, breakdown } = prediction;
    Ok((
        headers,
        Json(ExplainResp {
            result,
            breakdown,
            enrichment: outcome,
        }),
    )
        .into_response())
}

/* ----------------------------
Shared request flow
---------------------------- */

fn run_prediction(
    state: &AppState,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(PredictionRequest, Prediction), ApiError> {
    let Json(raw) = body.map_err(|e| ApiError::MalformedBody(e.body_text()))?;

    let req = PredictionRequest::from_json(&raw).map_err(|e| {
        metrics::record_validation_failure();
        warn!(error = %e, "prediction request rejected");
        e
    })?;

    let started = Instant::now();
    let prediction = state.engine.predict(&req);
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    metrics::record_prediction(elapsed_ms, &prediction.breakdown.fallbacks);

    info!(
        crop = %req.crop_type,
        state = %req.state,
        city = %req.city,
        predicted = prediction.result.predicted_price,
        current = prediction.result.current_price,
        confidence = prediction.result.confidence,
        fallback = prediction.used_fallback(),
        "prediction served"
    );

    Ok((req, prediction))
}

async fn run_enrichment(state: &AppState, req: &PredictionRequest) -> EnrichOutcome {
    let outcome = if state.enrich_enabled {
        enrich::enrich_with_timeout(Arc::as_ref(&state.enricher), req, state.enrich_timeout).await
    } else {
        EnrichOutcome::Off
    };
    metrics::record_enrichment(&outcome);
    outcome
}

fn diagnostic_headers(p: &Prediction, outcome: &EnrichOutcome) -> [(HeaderName, HeaderValue); 3] {
    let fallback = if p.breakdown.fallbacks.is_empty() {
        "none".to_string()
    } else {
        p.breakdown
            .fallbacks
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(",")
    };
    [
        (
            HDR_FALLBACK,
            HeaderValue::from_str(&fallback).unwrap_or(HeaderValue::from_static("none")),
        ),
        (
            HDR_ENRICH_USED,
            HeaderValue::from_static(if outcome.used() { "1" } else { "0" }),
        ),
        (HDR_ENRICH_REASON, HeaderValue::from_static(outcome.reason())),
    ]
}
