//! Enrichment: optional remote collaborator behind a narrow interface.
//!
//! The deterministic prediction is always computed first and is authoritative.
//! Enrichment only adds an advisory remote estimate. Every call runs under a
//! mandatory timeout; failures are logged and reported as an outcome, never as
//! an error of the prediction.

pub mod gradio;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::enrichment::{EnrichMode, EnrichmentConfig};
use crate::request::PredictionRequest;

pub use gradio::GradioEnricher;

/// Advisory estimate returned by a remote provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adjustment {
    pub remote_price: f64,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichError {
    #[error("enrichment upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("enrichment timed out after {0:?}")]
    TimedOut(Duration),
}

/// Capability seam for remote enrichment.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// `Ok(None)` means "nothing to add" (e.g. disabled).
    async fn attempt_enrich(
        &self,
        req: &PredictionRequest,
    ) -> Result<Option<Adjustment>, EnrichError>;

    /// Provider name for diagnostics/headers.
    fn provider_name(&self) -> &'static str;
}

pub type DynEnricher = Arc<dyn Enricher>;

/// What happened at the boundary, for headers and the explain payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichOutcome {
    Off,
    Used { adjustment: Adjustment },
    Empty,
    Failed { reason: String },
    TimedOut { after_ms: u64 },
}

impl EnrichOutcome {
    /// Short token for the `x-enrich-reason` header.
    pub fn reason(&self) -> &'static str {
        match self {
            EnrichOutcome::Off => "off",
            EnrichOutcome::Used { .. } => "ok",
            EnrichOutcome::Empty => "none",
            EnrichOutcome::Failed { .. } => "error",
            EnrichOutcome::TimedOut { .. } => "timeout",
        }
    }

    pub fn used(&self) -> bool {
        matches!(self, EnrichOutcome::Used { .. })
    }
}

/// Run one enrichment attempt under `timeout`. Never fails.
pub async fn enrich_with_timeout(
    enricher: &dyn Enricher,
    req: &PredictionRequest,
    timeout: Duration,
) -> EnrichOutcome {
    match tokio::time::timeout(timeout, enricher.attempt_enrich(req)).await {
        Ok(Ok(Some(adjustment))) => {
            debug!(provider = enricher.provider_name(), remote_price = adjustment.remote_price, "enrichment used");
            EnrichOutcome::Used { adjustment }
        }
        Ok(Ok(None)) => EnrichOutcome::Empty,
        Ok(Err(e)) => {
            warn!(provider = enricher.provider_name(), error = %e, "enrichment failed");
            EnrichOutcome::Failed {
                reason: e.to_string(),
            }
        }
        Err(_) => {
            let err = EnrichError::TimedOut(timeout);
            warn!(provider = enricher.provider_name(), error = %err, "enrichment failed");
            EnrichOutcome::TimedOut {
                after_ms: timeout.as_millis() as u64,
            }
        }
    }
}

/// Factory: pick the collaborator according to config.
///
/// * test modes (`mock`, `error`, `slow`) return in-process doubles
/// * disabled config returns `DisabledEnricher`
/// * otherwise the Gradio HTTP provider; if its client cannot be built we log and
///   run without enrichment
pub fn build_enricher(cfg: &EnrichmentConfig) -> DynEnricher {
    match cfg.mode {
        EnrichMode::Mock => return Arc::new(MockEnricher::default()),
        EnrichMode::Error => return Arc::new(FailingEnricher),
        EnrichMode::Slow => return Arc::new(SlowEnricher),
        EnrichMode::Live => {}
    }
    if !cfg.enabled {
        return Arc::new(DisabledEnricher);
    }
    match GradioEnricher::new(cfg) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            warn!(error = %e, "enrichment client unavailable; continuing without it");
            Arc::new(DisabledEnricher)
        }
    }
}

/// Returns `Ok(None)` always; used when enrichment is disabled.
pub struct DisabledEnricher;

#[async_trait]
impl Enricher for DisabledEnricher {
    async fn attempt_enrich(
        &self,
        _req: &PredictionRequest,
    ) -> Result<Option<Adjustment>, EnrichError> {
        Ok(None)
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic stand-in: a fixed price per request.
#[derive(Debug, Clone)]
pub struct MockEnricher {
    pub fixed_price: f64,
}

impl Default for MockEnricher {
    fn default() -> Self {
        Self {
            fixed_price: 2000.0,
        }
    }
}

#[async_trait]
impl Enricher for MockEnricher {
    async fn attempt_enrich(
        &self,
        _req: &PredictionRequest,
    ) -> Result<Option<Adjustment>, EnrichError> {
        Ok(Some(Adjustment {
            remote_price: self.fixed_price,
            provider: "mock".to_string(),
        }))
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Always reports the upstream as unavailable.
pub struct FailingEnricher;

#[async_trait]
impl Enricher for FailingEnricher {
    async fn attempt_enrich(
        &self,
        _req: &PredictionRequest,
    ) -> Result<Option<Adjustment>, EnrichError> {
        Err(EnrichError::UpstreamUnavailable(
            "simulated upstream failure".to_string(),
        ))
    }
    fn provider_name(&self) -> &'static str {
        "error"
    }
}

/// Sleeps far past any sane timeout.
pub struct SlowEnricher;

#[async_trait]
impl Enricher for SlowEnricher {
    async fn attempt_enrich(
        &self,
        _req: &PredictionRequest,
    ) -> Result<Option<Adjustment>, EnrichError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(None)
    }
    fn provider_name(&self) -> &'static str {
        "slow"
    }
}
