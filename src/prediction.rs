//! prediction.rs: output records for a price prediction.
//!
//! `PredictionResult` is the wire shape returned by `POST /predict`.
//! `PriceBreakdown` carries the explainable decomposition (every factor, which lookup
//! tier answered, the jitter bucket) and is only exposed by `POST /predict/explain`.

use serde::{Deserialize, Serialize};

use crate::error::FallbackUsed;
use crate::factors::{LookupTier, SupplyDemandFactor, WeatherFactor};

/// Tag identifying the deterministic code path.
pub const MODEL_TAG: &str = "deterministic-fallback";
/// Every base price is per quintal, so every reported price is too.
pub const PRICE_UNIT: &str = "quintal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_price: i64,
    pub current_price: i64,
    /// Reliability score in [0.0, 1.0].
    pub confidence: f64,
    /// `(predicted - current) / current * 100`, two decimals.
    pub change_percentage: f64,
    pub unit: String,
    pub model: String,
}

impl PredictionResult {
    /// Assemble the record from the two synthesized prices. The percentage is always
    /// derived from the reported integers so callers can reconcile it.
    pub fn format(
        predicted_price: i64,
        current_price: i64,
        confidence: f64,
    ) -> Self {
        Self {
            predicted_price,
            current_price,
            confidence: confidence.clamp(0.0, 1.0),
            change_percentage: change_percentage(predicted_price, current_price),
            unit: PRICE_UNIT.to_string(),
            model: MODEL_TAG.to_string(),
        }
    }
}

/// Rounded to two decimals; 0.0 when `current` is not positive.
pub fn change_percentage(predicted: i64, current: i64) -> f64 {
    if current <= 0 {
        return 0.0;
    }
    let pct = (predicted - current) as f64 / current as f64 * 100.0;
    round2(pct)
}

pub(crate) fn round2(x: f64) -> f64 {
    let r = (x * 100.0).round() / 100.0;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Every intermediate value that went into one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub crop_tier: LookupTier,
    pub seasonal_factor: f64,
    pub weather: WeatherFactor,
    pub weather_factor: f64,
    pub supply_demand: SupplyDemandFactor,
    pub location_factor: f64,
    pub location_tier: LookupTier,
    /// Product of all factors before jitter (unrounded current price).
    pub baseline_price: f64,
    pub jitter_bucket: u8,
    pub jitter_factor: f64,
    pub canonical_input: String,
    pub input_digest: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<FallbackUsed>,
}

/// Result plus breakdown, as produced by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub result: PredictionResult,
    pub breakdown: PriceBreakdown,
}

impl Prediction {
    pub fn used_fallback(&self) -> bool {
        !self.breakdown.fallbacks.is_empty()
    }
}
