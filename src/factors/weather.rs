//! Weather factor: two independent threshold rules, multiplied.
//!
//! Temperature: `> 35.0` → 1.10, `< 15.0` → 1.05, else 1.00.
//! Rainfall:    `< 50.0` → 1.15, `> 200.0` → 0.95, else 1.00.
//! Boundary values themselves (35.0, 15.0, 50.0, 200.0) are normal.

use serde::Serialize;

const HOT_ABOVE_C: f64 = 35.0;
const COLD_BELOW_C: f64 = 15.0;
const HOT_FACTOR: f64 = 1.10;
const COLD_FACTOR: f64 = 1.05;

const DRY_BELOW_MM: f64 = 50.0;
const WET_ABOVE_MM: f64 = 200.0;
const DRY_FACTOR: f64 = 1.15;
const WET_FACTOR: f64 = 0.95;

/// Which branch a threshold rule landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherBand {
    Normal,
    Hot,
    Cold,
    Dry,
    Wet,
}

impl WeatherBand {
    pub fn is_extreme(self) -> bool {
        self != WeatherBand::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherFactor {
    pub temperature_factor: f64,
    pub temperature_band: WeatherBand,
    pub rainfall_factor: f64,
    pub rainfall_band: WeatherBand,
}

impl WeatherFactor {
    /// Combined multiplier (no interaction term).
    pub fn combined(&self) -> f64 {
        self.temperature_factor * self.rainfall_factor
    }
}

pub fn temperature_factor(celsius: f64) -> (f64, WeatherBand) {
    if celsius > HOT_ABOVE_C {
        (HOT_FACTOR, WeatherBand::Hot)
    } else if celsius < COLD_BELOW_C {
        (COLD_FACTOR, WeatherBand::Cold)
    } else {
        (1.0, WeatherBand::Normal)
    }
}

pub fn rainfall_factor(mm: f64) -> (f64, WeatherBand) {
    if mm < DRY_BELOW_MM {
        (DRY_FACTOR, WeatherBand::Dry)
    } else if mm > WET_ABOVE_MM {
        (WET_FACTOR, WeatherBand::Wet)
    } else {
        (1.0, WeatherBand::Normal)
    }
}

pub fn weather_factor(celsius: f64, rainfall_mm: f64) -> WeatherFactor {
    let (temperature_factor, temperature_band) = temperature_factor(celsius);
    let (rainfall_factor, rainfall_band) = rainfall_factor(rainfall_mm);
    WeatherFactor {
        temperature_factor,
        temperature_band,
        rainfall_factor,
        rainfall_band,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_boundaries() {
        assert_eq!(temperature_factor(34.9), (1.0, WeatherBand::Normal));
        assert_eq!(temperature_factor(35.0), (1.0, WeatherBand::Normal));
        assert_eq!(temperature_factor(35.1), (1.10, WeatherBand::Hot));
        assert_eq!(temperature_factor(15.0), (1.0, WeatherBand::Normal));
        assert_eq!(temperature_factor(14.9), (1.05, WeatherBand::Cold));
    }

    #[test]
    fn rainfall_boundaries() {
        assert_eq!(rainfall_factor(49.9), (1.15, WeatherBand::Dry));
        assert_eq!(rainfall_factor(50.0), (1.0, WeatherBand::Normal));
        assert_eq!(rainfall_factor(200.0), (1.0, WeatherBand::Normal));
        assert_eq!(rainfall_factor(200.1), (0.95, WeatherBand::Wet));
    }

    #[test]
    fn combined_is_plain_product() {
        let w = weather_factor(40.0, 10.0);
        assert!((w.combined() - 1.10 * 1.15).abs() < 1e-12);
        assert!(w.temperature_band.is_extreme() && w.rainfall_band.is_extreme());

        let calm = weather_factor(25.0, 100.0);
        assert_eq!(calm.combined(), 1.0);
        assert!(!calm.temperature_band.is_extreme());
    }
}
