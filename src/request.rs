//! # Input Normalizer
//!
//! Turns a raw JSON request into a `PredictionRequest`:
//! - required: `crop_type`, `state`, `year` (1900..=2100), `month` (1..=12)
//! - numeric fields accept JSON numbers or numeric strings
//! - optional numerics fall back to fixed defaults so partial requests still price
//! - `season` is derived from `month` when absent or blank
//! - `fertilizer_usage` never blocks: bad values fall back to the default
//!
//! All field problems are collected into one `ValidationError`.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{FieldError, ValidationError};

pub const DEFAULT_TEMPERATURE_C: f64 = 25.0;
pub const DEFAULT_RAINFALL_MM: f64 = 100.0;
pub const DEFAULT_SUPPLY: f64 = 1000.0;
pub const DEFAULT_DEMAND: f64 = 1000.0;
pub const DEFAULT_FERTILIZER: f64 = 50.0;

pub const MIN_YEAR: i64 = 1900;
pub const MAX_YEAR: i64 = 2100;

/// Validated, defaulted input to the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRequest {
    pub crop_type: String,
    pub state: String,
    /// Empty when the caller gave no city.
    pub city: String,
    pub year: i32,
    pub month: u32,
    pub season: String,
    pub temperature: f64,
    pub rainfall: f64,
    pub supply: f64,
    pub demand: f64,
    /// Reserved for a future factor; only feeds the jitter canonical form.
    pub fertilizer_usage: f64,
}

impl PredictionRequest {
    /// Normalize a raw JSON value (must be an object).
    pub fn from_json(raw: &Value) -> Result<Self, ValidationError> {
        match raw.as_object() {
            Some(obj) => normalize(obj),
            None => Err(ValidationError::single(
                "body",
                "request body must be a JSON object",
            )),
        }
    }
}

/// Fixed month → season mapping (Indian agricultural calendar).
pub fn season_for_month(month: u32) -> &'static str {
    match month {
        6..=10 => "Kharif",
        4 | 5 => "Zaid",
        _ => "Rabi",
    }
}

/// Validate and default every field of a raw request object.
pub fn normalize(obj: &Map<String, Value>) -> Result<PredictionRequest, ValidationError> {
    let mut errors = Vec::new();

    let crop_type = required_text(obj, "crop_type", &mut errors);
    let state = required_text(obj, "state", &mut errors);
    let city = optional_text(obj, "city", &mut errors).unwrap_or_default();

    let year = match required_int(obj, "year", &mut errors) {
        Some(y) if (MIN_YEAR..=MAX_YEAR).contains(&y) => Some(y as i32),
        Some(y) => {
            errors.push(FieldError::new(
                "year",
                format!("must be between {MIN_YEAR} and {MAX_YEAR}, got {y}"),
            ));
            None
        }
        None => None,
    };

    let month = match required_int(obj, "month", &mut errors) {
        Some(m) if (1..=12).contains(&m) => Some(m as u32),
        Some(m) => {
            errors.push(FieldError::new(
                "month",
                format!("must be between 1 and 12, got {m}"),
            ));
            None
        }
        None => None,
    };

    let season = optional_text(obj, "season", &mut errors);

    let temperature = optional_real(obj, "temperature", DEFAULT_TEMPERATURE_C, false, &mut errors);
    let rainfall = optional_real(obj, "rainfall", DEFAULT_RAINFALL_MM, true, &mut errors);
    let supply = optional_real(obj, "supply", DEFAULT_SUPPLY, true, &mut errors);
    let demand = optional_real(obj, "demand", DEFAULT_DEMAND, true, &mut errors);
    let fertilizer_usage = lenient_fertilizer(obj);

    match (crop_type, state, year, month) {
        (Some(crop_type), Some(state), Some(year), Some(month)) if errors.is_empty() => {
            let season = season
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| season_for_month(month).to_string());
            Ok(PredictionRequest {
                crop_type,
                state,
                city,
                year,
                month,
                season,
                temperature,
                rainfall,
                supply,
                demand,
                fertilizer_usage,
            })
        }
        _ => Err(ValidationError { fields: errors }),
    }
}

/* ----------------------------
Field coercion helpers
---------------------------- */

fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn required_text(
    obj: &Map<String, Value>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match present(obj, field) {
        None => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::String(_)) => {
            errors.push(FieldError::new(field, "must not be empty"));
            None
        }
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("must be a string, got {}", kind_of(other)),
            ));
            None
        }
    }
}

fn optional_text(
    obj: &Map<String, Value>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match present(obj, field) {
        None => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(other) => {
            errors.push(FieldError::new(
                field,
                format!("must be a string, got {}", kind_of(other)),
            ));
            None
        }
    }
}

fn required_int(
    obj: &Map<String, Value>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<i64> {
    let Some(v) = present(obj, field) else {
        errors.push(FieldError::new(field, "is required"));
        return None;
    };
    match coerce_int(v) {
        Some(i) => Some(i),
        None => {
            errors.push(FieldError::new(
                field,
                format!("must be an integer, got {}", describe(v)),
            ));
            None
        }
    }
}

fn optional_real(
    obj: &Map<String, Value>,
    field: &'static str,
    default: f64,
    non_negative: bool,
    errors: &mut Vec<FieldError>,
) -> f64 {
    let Some(v) = present(obj, field) else {
        return default;
    };
    match coerce_real(v) {
        Some(x) if non_negative && x < 0.0 => {
            errors.push(FieldError::new(field, format!("must be >= 0, got {x}")));
            default
        }
        Some(x) => x,
        None => {
            errors.push(FieldError::new(
                field,
                format!("must be a finite number, got {}", describe(v)),
            ));
            default
        }
    }
}

fn lenient_fertilizer(obj: &Map<String, Value>) -> f64 {
    match present(obj, "fertilizer_usage").map(coerce_real) {
        None => DEFAULT_FERTILIZER,
        Some(Some(x)) if x >= 0.0 => x,
        Some(_) => {
            debug!(
                default = DEFAULT_FERTILIZER,
                "fertilizer_usage unusable; falling back to default"
            );
            DEFAULT_FERTILIZER
        }
    }
}

/// Number or numeric string → finite f64.
fn coerce_real(v: &Value) -> Option<f64> {
    let x = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}

/// Integer, integral float, or integer string → i64.
fn coerce_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15).then_some(f as i64)
        }),
        Value::String(s) => {
            let t = s.trim();
            t.parse::<i64>().ok().or_else(|| {
                let f = t.parse::<f64>().ok()?;
                (f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15).then_some(f as i64)
            })
        }
        _ => None,
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn describe(v: &Value) -> String {
    match v {
        Value::String(s) => format!("\"{s}\""),
        Value::Number(n) => n.to_string(),
        other => kind_of(other).to_string(),
    }
}
