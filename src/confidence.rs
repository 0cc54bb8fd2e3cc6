//! Confidence: baseline minus a fixed penalty for every factor that landed in an
//! extreme or fallback branch. Penalties are non-negative, so adding extreme
//! conditions can only lower the score. Clamped to [0, 1], rounded to 3 decimals.

use serde::Serialize;

use crate::factors::{FactorSet, LookupTier};

pub const BASELINE: f64 = 0.85;

pub const PENALTY_UNKNOWN_CROP: f64 = 0.15;
pub const PENALTY_UNKNOWN_LOCATION: f64 = 0.10;
pub const PENALTY_STATE_ONLY_LOCATION: f64 = 0.05;
pub const PENALTY_TEMPERATURE_EXTREME: f64 = 0.10;
pub const PENALTY_RAINFALL_EXTREME: f64 = 0.10;
pub const PENALTY_SUPPLY_DEMAND_CLAMPED: f64 = 0.05;

/// Flags that pull confidence down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtremeFlags {
    pub unknown_crop: bool,
    pub unknown_location: bool,
    pub state_only_location: bool,
    pub temperature_extreme: bool,
    pub rainfall_extreme: bool,
    pub supply_demand_clamped: bool,
}

impl ExtremeFlags {
    pub fn from_factors(f: &FactorSet) -> Self {
        Self {
            unknown_crop: f.crop_tier == LookupTier::Default,
            unknown_location: f.location_tier == LookupTier::Default,
            state_only_location: f.location_tier == LookupTier::Partial,
            temperature_extreme: f.weather.temperature_band.is_extreme(),
            rainfall_extreme: f.weather.rainfall_band.is_extreme(),
            supply_demand_clamped: f.supply_demand.clamped,
        }
    }

    pub fn count(&self) -> usize {
        [
            self.unknown_crop,
            self.unknown_location,
            self.state_only_location,
            self.temperature_extreme,
            self.rainfall_extreme,
            self.supply_demand_clamped,
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }
}

pub fn estimate(flags: &ExtremeFlags) -> f64 {
    let penalties = [
        (flags.unknown_crop, PENALTY_UNKNOWN_CROP),
        (flags.unknown_location, PENALTY_UNKNOWN_LOCATION),
        (flags.state_only_location, PENALTY_STATE_ONLY_LOCATION),
        (flags.temperature_extreme, PENALTY_TEMPERATURE_EXTREME),
        (flags.rainfall_extreme, PENALTY_RAINFALL_EXTREME),
        (flags.supply_demand_clamped, PENALTY_SUPPLY_DEMAND_CLAMPED),
    ];
    let total: f64 = penalties
        .iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, p)| p)
        .sum();
    round3((BASELINE - total).clamp(0.0, 1.0))
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
