//! # Price Engine
//! Pure, testable logic that maps `(PredictionRequest, FactorTables)` → `Prediction`.
//! No I/O, no shared mutable state; safe to call from any number of tasks at once.
//!
//! Pipeline: factors (seasonal, weather, supply-demand, location) + jitter →
//! synthesized prices → confidence → formatted result.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::confidence::{self, ExtremeFlags};
use crate::error::{FallbackUsed, ValidationError};
use crate::factors::{FactorSet, FactorTables, LookupTier};
use crate::jitter;
use crate::prediction::{Prediction, PredictionResult, PriceBreakdown};
use crate::request::PredictionRequest;

/// Holds the injected, read-only tables. Cloning shares them.
#[derive(Debug, Clone)]
pub struct PriceEngine {
    tables: Arc<FactorTables>,
}

/// Rounded prices derived from the factor product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesizedPrice {
    pub baseline: f64,
    pub predicted_price: i64,
    pub current_price: i64,
}

impl PriceEngine {
    pub fn new(tables: FactorTables) -> Self {
        Self {
            tables: Arc::new(tables),
        }
    }

    pub fn tables(&self) -> &FactorTables {
        &self.tables
    }

    /// Normalize a raw JSON body, then predict.
    pub fn predict_json(&self, raw: &Value) -> Result<Prediction, ValidationError> {
        let req = PredictionRequest::from_json(raw)?;
        Ok(self.predict(&req))
    }

    pub fn predict(&self, req: &PredictionRequest) -> Prediction {
        let factors = FactorSet::compute(req, &self.tables);
        let jitter = jitter::jitter_for(req);
        let price = synthesize(factors.baseline(), jitter.multiplier);

        let flags = ExtremeFlags::from_factors(&factors);
        let confidence = confidence::estimate(&flags);
        let fallbacks = fallbacks_for(&factors, !req.city.is_empty());

        debug!(
            crop = %req.crop_type,
            state = %req.state,
            predicted = price.predicted_price,
            current = price.current_price,
            confidence,
            jitter_bucket = jitter.bucket,
            extremes = flags.count(),
            "price synthesized"
        );

        let result = PredictionResult::format(
            price.predicted_price,
            price.current_price,
            confidence,
        );

        let breakdown = PriceBreakdown {
            base_price: factors.base_price,
            crop_tier: factors.crop_tier,
            seasonal_factor: factors.seasonal,
            weather: factors.weather,
            weather_factor: factors.weather.combined(),
            supply_demand: factors.supply_demand,
            location_factor: factors.location,
            location_tier: factors.location_tier,
            baseline_price: price.baseline,
            jitter_bucket: jitter.bucket,
            jitter_factor: jitter.multiplier,
            canonical_input: jitter.canonical,
            input_digest: jitter.digest,
            fallbacks,
        };

        Prediction { result, breakdown }
    }
}

impl Default for PriceEngine {
    fn default() -> Self {
        Self::new(FactorTables::builtin())
    }
}

/// `predicted = round(baseline * jitter)`, `current = round(baseline)`.
/// Both are floored at 1 so the change percentage always has a denominator.
pub fn synthesize(baseline: f64, jitter_factor: f64) -> SynthesizedPrice {
    SynthesizedPrice {
        baseline,
        predicted_price: round_price(baseline * jitter_factor),
        current_price: round_price(baseline),
    }
}

fn round_price(x: f64) -> i64 {
    (x.round() as i64).max(1)
}

fn fallbacks_for(f: &FactorSet, city_given: bool) -> Vec<FallbackUsed> {
    let mut out = Vec::new();
    if f.crop_tier == LookupTier::Default {
        out.push(FallbackUsed::UnknownCrop);
    }
    match f.location_tier {
        LookupTier::Default => out.push(FallbackUsed::UnknownLocation),
        LookupTier::Partial if city_given => out.push(FallbackUsed::StateOnlyLocation),
        _ => {}
    }
    out
}
