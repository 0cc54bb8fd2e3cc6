// src/factors/mod.rs
//! Factor calculators: pure functions from a normalized request (plus tables) to
//! multiplicative factors. Each calculator is independent of the others.

pub mod supply_demand;
pub mod tables;
pub mod weather;

use serde::Serialize;

use crate::request::PredictionRequest;

pub use supply_demand::{supply_demand_factor, SupplyDemandFactor};
pub use tables::{FactorTables, Lookup, LookupTier, SupplyDemandBand};
pub use weather::{weather_factor, WeatherBand, WeatherFactor};

/// All factor values for one request, before jitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactorSet {
    pub base_price: f64,
    pub crop_tier: LookupTier,
    pub seasonal: f64,
    pub weather: WeatherFactor,
    pub supply_demand: SupplyDemandFactor,
    pub location: f64,
    pub location_tier: LookupTier,
}

impl FactorSet {
    pub fn compute(req: &PredictionRequest, tables: &FactorTables) -> Self {
        let crop = tables.base_price(&req.crop_type);
        let location = tables.location_multiplier(&req.state, &req.city);
        Self {
            base_price: crop.value,
            crop_tier: crop.tier,
            seasonal: seasonal_factor(req.month, tables),
            weather: weather_factor(req.temperature, req.rainfall),
            supply_demand: supply_demand_factor(
                req.supply,
                req.demand,
                &tables.supply_demand_band(),
            ),
            location: location.value,
            location_tier: location.tier,
        }
    }

    /// Product of every factor except jitter.
    pub fn baseline(&self) -> f64 {
        self.base_price
            * self.seasonal
            * self.supply_demand.multiplier
            * self.weather.combined()
            * self.location
    }
}

/// Table value for the month; neutral for months the normalizer would have rejected.
pub fn seasonal_factor(month: u32, tables: &FactorTables) -> f64 {
    tables.seasonal(month).unwrap_or(1.0)
}
