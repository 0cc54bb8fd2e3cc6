// src/config/enrichment.rs
use std::env;
use std::time::Duration;

/// Public Hugging Face Space serving the reference model.
pub const DEFAULT_ENRICH_URL: &str = "https://rajkhanke007-crop-price-prediction.hf.space";
pub const DEFAULT_ENRICH_TIMEOUT_MS: u64 = 3_000;

/// How the enrichment collaborator should behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichMode {
    /// Real HTTP provider (only when enabled).
    Live,
    /// Deterministic in-process stand-in.
    Mock,
    /// Always fails with `UpstreamUnavailable`.
    Error,
    /// Never answers in time; exercises the timeout path.
    Slow,
}

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Bearer token; empty means anonymous.
    pub api_key: String,
    pub timeout: Duration,
    pub mode: EnrichMode,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: DEFAULT_ENRICH_URL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_millis(DEFAULT_ENRICH_TIMEOUT_MS),
            mode: EnrichMode::Live,
        }
    }
}

impl EnrichmentConfig {
    /// Read `ENRICH_*` variables (and `HUGGINGFACE_API_KEY` as a key fallback).
    ///
    /// `ENRICH_TEST_MODE` (`mock` / `error` / `slow`) forces a test double and implies
    /// enabled, mirroring how the HTTP tests drive the boundary.
    pub fn from_env() -> Self {
        let mode = match env::var("ENRICH_TEST_MODE")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "mock" => EnrichMode::Mock,
            "error" => EnrichMode::Error,
            "slow" => EnrichMode::Slow,
            _ => EnrichMode::Live,
        };

        let enabled = mode != EnrichMode::Live
            || env::var("ENRICH_ENABLED")
                .map(|v| parse_bool(&v))
                .unwrap_or(false);

        let base_url = env::var("ENRICH_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ENRICH_URL.to_string());

        let api_key = env::var("ENRICH_API_KEY")
            .or_else(|_| env::var("HUGGINGFACE_API_KEY"))
            .unwrap_or_default()
            .trim()
            .to_string();

        let timeout_ms = env::var("ENRICH_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_ENRICH_TIMEOUT_MS);

        Self {
            enabled,
            base_url,
            api_key,
            timeout: Duration::from_millis(timeout_ms),
            mode,
        }
    }
}

pub(crate) fn parse_bool(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
