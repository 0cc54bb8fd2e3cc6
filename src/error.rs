//! Error taxonomy for the prediction core.
//!
//! - `ValidationError`: the only hard failure. Carries one entry per offending field.
//! - `FallbackUsed`: informational, never returned as `Err`. Lowers confidence and is
//!   reported in the breakdown and the `x-price-fallback` header.
//!
//! Remote enrichment failures live in `crate::enrich::EnrichError` and never reach here.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single field-level validation problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Request rejected before any computation was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid prediction request: {}", summarize(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError::new(field, message)],
        }
    }

    /// True if any entry refers to `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Non-fatal: a default table entry stood in for a missing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackUsed {
    /// Crop not in the base price table; default base price used.
    UnknownCrop,
    /// City not listed for a known state; state multiplier used.
    StateOnlyLocation,
    /// Neither state nor city known; neutral multiplier used.
    UnknownLocation,
}

impl FallbackUsed {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackUsed::UnknownCrop => "unknown_crop",
            FallbackUsed::StateOnlyLocation => "state_only_location",
            FallbackUsed::UnknownLocation => "unknown_location",
        }
    }
}
