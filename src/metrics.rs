use axum::{routing::get, Router};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::enrich::EnrichOutcome;
use crate::error::FallbackUsed;

// A process may build the router many times (tests); the recorder is global.
static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process and return a handle to it.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| PrometheusBuilder::new().install_recorder())?
            .clone();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

pub fn record_prediction(duration_ms: f64, fallbacks: &[FallbackUsed]) {
    counter!("price_predictions_total").increment(1);
    histogram!("price_predict_duration_ms").record(duration_ms);
    for f in fallbacks {
        counter!("price_fallback_total", "kind" => f.as_str()).increment(1);
    }
}

pub fn record_validation_failure() {
    counter!("price_validation_failures_total").increment(1);
}

pub fn record_enrichment(outcome: &EnrichOutcome) {
    counter!("price_enrichment_total", "outcome" => outcome.reason()).increment(1);
}
