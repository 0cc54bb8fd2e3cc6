//! Gradio / Hugging Face Space provider.
//!
//! Posts the request as a positional Gradio payload to a list of well-known endpoint
//! paths and takes the first successful answer. The price is read from `data[0]`,
//! falling back to a top-level `prediction` field.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{Adjustment, EnrichError, Enricher};
use crate::config::enrichment::EnrichmentConfig;
use crate::request::PredictionRequest;

const ENDPOINT_PATHS: &[&str] = &[
    "/run/predict",
    "/api/predict",
    "/predict",
    "/call/predict",
    "/gradio_api/call/predict",
];

pub struct GradioEnricher {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct GradioPayload {
    data: Vec<Value>,
    fn_index: u32,
}

impl GradioEnricher {
    pub fn new(cfg: &EnrichmentConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("crop-price-engine/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(2).min(cfg.timeout))
            .timeout(cfg.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
        })
    }

    fn payload(req: &PredictionRequest) -> GradioPayload {
        GradioPayload {
            data: vec![
                Value::from(req.crop_type.as_str()),
                Value::from(req.state.as_str()),
                Value::from(req.city.as_str()),
                Value::from(req.year),
                Value::from(req.month),
                Value::from(req.season.as_str()),
                Value::from(req.temperature),
                Value::from(req.rainfall),
                Value::from(req.supply),
                Value::from(req.demand),
                Value::from(req.fertilizer_usage),
            ],
            fn_index: 0,
        }
    }
}

/// Pull a positive finite price out of a Gradio response body.
pub fn extract_price(body: &Value) -> Option<f64> {
    let candidate = body
        .get("data")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .or_else(|| body.get("prediction"))?;
    let price = match candidate {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (price.is_finite() && price > 0.0).then_some(price)
}

#[async_trait]
impl Enricher for GradioEnricher {
    async fn attempt_enrich(
        &self,
        req: &PredictionRequest,
    ) -> Result<Option<Adjustment>, EnrichError> {
        let payload = Self::payload(req);
        let mut last_error = String::from("no endpoint answered");

        for path in ENDPOINT_PATHS {
            let url = format!("{}{}", self.base_url, path);
            let mut call = self.http.post(&url).json(&payload);
            if !self.api_key.is_empty() {
                call = call.bearer_auth(&self.api_key);
            }

            let resp = match call.send().await {
                Ok(r) => r,
                Err(e) => {
                    debug!(%url, error = %e, "enrichment endpoint unreachable");
                    last_error = e.to_string();
                    continue;
                }
            };
            if !resp.status().is_success() {
                debug!(%url, status = %resp.status(), "enrichment endpoint rejected request");
                last_error = format!("{url} returned {}", resp.status());
                continue;
            }
            let body: Value = match resp.json().await {
                Ok(b) => b,
                Err(e) => {
                    last_error = format!("{url} returned unreadable body: {e}");
                    continue;
                }
            };
            if let Some(remote_price) = extract_price(&body) {
                return Ok(Some(Adjustment {
                    remote_price,
                    provider: self.provider_name().to_string(),
                }));
            }
            last_error = format!("{url} returned no usable price");
        }

        Err(EnrichError::UpstreamUnavailable(last_error))
    }

    fn provider_name(&self) -> &'static str {
        "huggingface-gradio"
    }
}
