//! Supply-demand factor.
//!
//! `ratio = demand / supply`; multiplier = `clamp(1 + elasticity * (ratio - 1), floor, ceiling)`.
//! Non-decreasing in the ratio for any elasticity >= 0, and always inside the band.
//!
//! Zero handling keeps monotonicity intact:
//! - supply 0, demand 0 → neutral ratio 1.0
//! - supply 0, demand > 0 → infinite ratio (ceiling)

use serde::Serialize;

use super::tables::SupplyDemandBand;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SupplyDemandFactor {
    /// `None` when the ratio is unbounded (no supply at all).
    pub ratio: Option<f64>,
    pub multiplier: f64,
    /// True when the raw curve left the band.
    pub clamped: bool,
}

pub fn demand_supply_ratio(supply: f64, demand: f64) -> f64 {
    if supply > 0.0 {
        demand / supply
    } else if demand > 0.0 {
        f64::INFINITY
    } else {
        1.0
    }
}

pub fn supply_demand_factor(supply: f64, demand: f64, band: &SupplyDemandBand) -> SupplyDemandFactor {
    let ratio = demand_supply_ratio(supply, demand);

    let raw = if ratio.is_infinite() {
        f64::INFINITY
    } else if band.elasticity == 0.0 {
        1.0
    } else {
        1.0 + band.elasticity * (ratio - 1.0)
    };
    let multiplier = raw.clamp(band.floor, band.ceiling);

    SupplyDemandFactor {
        ratio: ratio.is_finite().then_some(ratio),
        multiplier,
        clamped: raw < band.floor || raw > band.ceiling,
    }
}
