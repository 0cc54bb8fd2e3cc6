//! # Factor Tables
//!
//! Read-only lookup data the engine prices against:
//! - crop → base price (currency per quintal), with a default for unknown crops
//! - month → seasonal multiplier (all twelve months)
//! - state → multiplier, plus optional per-city multipliers
//! - the supply-demand band (floor, ceiling, elasticity)
//!
//! Loaded once at startup from TOML (`config/factor_tables.toml`, or
//! `$FACTOR_TABLES_PATH`), falling back to `FactorTables::builtin()`.
//! Never mutated afterwards; share it behind an `Arc`.
//!
//! Lookups normalize keys (case, whitespace, dashes) and report which tier answered.

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_FACTOR_TABLES_PATH: &str = "config/factor_tables.toml";
pub const ENV_FACTOR_TABLES_PATH: &str = "FACTOR_TABLES_PATH";

/// Which tier of a lookup produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupTier {
    /// Full key matched (crop, or state + city).
    Exact,
    /// Only the coarser key matched (state without city).
    Partial,
    /// Nothing matched; configured default used.
    Default,
}

/// Tagged lookup answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lookup {
    pub value: f64,
    pub tier: LookupTier,
}

/// Multipliers for one state.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateLocation {
    #[serde(default = "neutral")]
    pub multiplier: f64,
    #[serde(default)]
    pub cities: HashMap<String, f64>,
}

/// Supply-demand mapping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SupplyDemandBand {
    #[serde(default = "default_sd_floor")]
    pub floor: f64,
    #[serde(default = "default_sd_ceiling")]
    pub ceiling: f64,
    /// Slope of the multiplier around ratio 1.0. Must be >= 0.
    #[serde(default = "neutral")]
    pub elasticity: f64,
}

impl Default for SupplyDemandBand {
    fn default() -> Self {
        Self {
            floor: default_sd_floor(),
            ceiling: default_sd_ceiling(),
            elasticity: 1.0,
        }
    }
}

fn neutral() -> f64 {
    1.0
}
fn default_sd_floor() -> f64 {
    0.8
}
fn default_sd_ceiling() -> f64 {
    1.3
}
fn default_base_price() -> f64 {
    2000.0
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
struct TablesRoot {
    #[serde(default)]
    pricing: PricingSection,
    #[serde(default)]
    base_prices: HashMap<String, f64>,
    seasonal: SeasonalSection,
    #[serde(default)]
    locations: HashMap<String, StateLocation>,
    #[serde(default)]
    supply_demand: SupplyDemandBand,
}

/// Prices are always per quintal; there is no unit key to relabel them.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct PricingSection {
    #[serde(default = "default_base_price")]
    default_base_price: f64,
}

impl Default for PricingSection {
    fn default() -> Self {
        Self {
            default_base_price: default_base_price(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SeasonalSection {
    /// January first.
    by_month: Vec<f64>,
}

/* ----------------------------
Validated tables
---------------------------- */

#[derive(Debug, Clone, PartialEq)]
pub struct FactorTables {
    default_base_price: f64,
    base_prices: HashMap<String, f64>,
    seasonal: [f64; 12],
    locations: HashMap<String, StateLocation>,
    supply_demand: SupplyDemandBand,
}

impl FactorTables {
    /// Resolve `$FACTOR_TABLES_PATH` or the default path. A missing file yields the
    /// built-in seed; a present but broken file is an error.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_FACTOR_TABLES_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_FACTOR_TABLES_PATH));

        if !path.exists() {
            warn!(path = %path.display(), "factor tables not found; using built-in seed");
            return Ok(Self::builtin());
        }
        Self::load_from_file(&path)
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading factor tables from {}", path.display()))?;
        let tables = Self::from_toml_str(&content)
            .with_context(|| format!("parsing factor tables at {}", path.display()))?;
        info!(
            path = %path.display(),
            crops = tables.base_prices.len(),
            states = tables.locations.len(),
            "factor tables loaded"
        );
        Ok(tables)
    }

    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let root: TablesRoot = toml::from_str(toml_str)?;

        let seasonal: [f64; 12] = root.seasonal.by_month.as_slice().try_into().map_err(|_| {
            anyhow!(
                "seasonal.by_month must list exactly 12 months, got {}",
                root.seasonal.by_month.len()
            )
        })?;

        let base_prices = normalize_keys("base_prices", root.base_prices)?;

        let mut states: Vec<_> = normalize_keys("locations", root.locations)?
            .into_iter()
            .collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));

        let mut locations = HashMap::new();
        for (state, loc) in states {
            let cities = normalize_keys(&format!("locations.{state}.cities"), loc.cities)?;
            locations.insert(
                state,
                StateLocation {
                    multiplier: loc.multiplier,
                    cities,
                },
            );
        }

        let tables = Self {
            default_base_price: root.pricing.default_base_price,
            base_prices,
            seasonal,
            locations,
            supply_demand: root.supply_demand,
        };
        tables.validate()?;
        Ok(tables)
    }

    /// Every value must be usable as a multiplicative factor.
    fn validate(&self) -> anyhow::Result<()> {
        ensure_positive("pricing.default_base_price", self.default_base_price)?;
        for (crop, &p) in &self.base_prices {
            ensure_positive(&format!("base_prices.{crop}"), p)?;
        }
        for (i, &m) in self.seasonal.iter().enumerate() {
            ensure_positive(&format!("seasonal.by_month[{i}]"), m)?;
        }
        for (state, loc) in &self.locations {
            ensure_positive(&format!("locations.{state}.multiplier"), loc.multiplier)?;
            for (city, &m) in &loc.cities {
                ensure_positive(&format!("locations.{state}.cities.{city}"), m)?;
            }
        }

        let band = &self.supply_demand;
        ensure_positive("supply_demand.floor", band.floor)?;
        ensure_positive("supply_demand.ceiling", band.ceiling)?;
        if !(band.floor <= 1.0 && 1.0 <= band.ceiling) {
            bail!(
                "supply_demand band must contain 1.0 (floor {} / ceiling {})",
                band.floor,
                band.ceiling
            );
        }
        if !band.elasticity.is_finite() || band.elasticity < 0.0 {
            bail!("supply_demand.elasticity must be >= 0, got {}", band.elasticity);
        }
        Ok(())
    }

    /// Built-in seed with the reference crop prices, seasonal curve and a handful of
    /// Indian states/cities. Used when no config file is present.
    pub fn builtin() -> Self {
        let base_prices = [
            ("rice", 2000.0),
            ("wheat", 1800.0),
            ("maize", 1500.0),
            ("pulses", 6000.0),
            ("soybeans", 3800.0),
            ("cotton", 5500.0),
            ("sugarcane", 300.0),
            ("potato", 1200.0),
            ("tomato", 1800.0),
            ("onion", 1400.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let mut locations = HashMap::new();
        for (state, multiplier, cities) in [
            ("punjab", 1.02, &[("ludhiana", 1.05), ("amritsar", 1.03)][..]),
            ("haryana", 1.01, &[("karnal", 1.02), ("hisar", 0.99)][..]),
            ("maharashtra", 1.04, &[("mumbai", 1.12), ("pune", 1.06), ("nashik", 0.97)][..]),
            ("uttar pradesh", 0.97, &[("lucknow", 1.01), ("kanpur", 0.98)][..]),
            ("madhya pradesh", 0.96, &[("indore", 1.00), ("bhopal", 0.99)][..]),
            ("karnataka", 1.03, &[("bengaluru", 1.10), ("mysuru", 1.01)][..]),
            ("tamil nadu", 1.02, &[("chennai", 1.08), ("coimbatore", 1.01)][..]),
            ("west bengal", 0.99, &[("kolkata", 1.06)][..]),
            ("gujarat", 1.01, &[("ahmedabad", 1.05), ("rajkot", 0.98)][..]),
            ("rajasthan", 0.98, &[("jaipur", 1.02)][..]),
        ] {
            let cities = cities
                .iter()
                .map(|(c, m)| (c.to_string(), *m))
                .collect();
            locations.insert(state.to_string(), StateLocation { multiplier, cities });
        }

        Self {
            default_base_price: default_base_price(),
            base_prices,
            seasonal: [
                1.10, 1.05, 1.00, 0.95, 0.90, 0.85, 0.90, 0.95, 1.00, 1.05, 1.10, 1.15,
            ],
            locations,
            supply_demand: SupplyDemandBand::default(),
        }
    }

    /// Exact normalized crop match, else the default base price.
    pub fn base_price(&self, crop: &str) -> Lookup {
        match self.base_prices.get(&normalize_key(crop)) {
            Some(&value) => Lookup {
                value,
                tier: LookupTier::Exact,
            },
            None => Lookup {
                value: self.default_base_price,
                tier: LookupTier::Default,
            },
        }
    }

    /// Ordered degradation: (state, city) → state → neutral 1.0.
    pub fn location_multiplier(&self, state: &str, city: &str) -> Lookup {
        let Some(loc) = self.locations.get(&normalize_key(state)) else {
            return Lookup {
                value: 1.0,
                tier: LookupTier::Default,
            };
        };
        match loc.cities.get(&normalize_key(city)) {
            Some(&value) => Lookup {
                value,
                tier: LookupTier::Exact,
            },
            None => Lookup {
                value: loc.multiplier,
                tier: LookupTier::Partial,
            },
        }
    }

    /// Seasonal multiplier for `month` in 1..=12. `None` outside that range.
    pub fn seasonal(&self, month: u32) -> Option<f64> {
        let idx = usize::try_from(month).ok()?.checked_sub(1)?;
        self.seasonal.get(idx).copied()
    }

    pub fn supply_demand_band(&self) -> SupplyDemandBand {
        self.supply_demand
    }

    pub fn default_base_price(&self) -> f64 {
        self.default_base_price
    }

    /// Known crop keys, sorted.
    pub fn crops(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.base_prices.keys().map(String::as_str).collect();
        v.sort_unstable();
        v
    }
}

impl Default for FactorTables {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Re-key a table by `normalize_key`. Two spellings of one key are rejected, since
/// `HashMap` order would otherwise decide which value survives.
fn normalize_keys<V>(
    section: &str,
    raw: HashMap<String, V>,
) -> anyhow::Result<HashMap<String, V>> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    let mut entries: Vec<(String, V)> = raw.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = HashMap::with_capacity(entries.len());
    for (original, value) in entries {
        let key = normalize_key(&original);
        if let Some(first) = seen.get(&key) {
            bail!("{section}: {first:?} and {original:?} both normalize to {key:?}");
        }
        seen.insert(key.clone(), original);
        out.insert(key, value);
    }
    Ok(out)
}

fn ensure_positive(what: &str, v: f64) -> anyhow::Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(anyhow!("{what} must be a finite number > 0, got {v}"))
    }
}

/// Lowercase, treat dashes/underscores/dots as spaces, collapse whitespace.
pub fn normalize_key(s: &str) -> String {
    let mut out = s.trim().to_lowercase();
    out = out.replace(['—', '–', '-', '_', '.', ','], " ");
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
