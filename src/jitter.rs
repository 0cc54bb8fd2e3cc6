//! # Deterministic Jitter
//!
//! A small input-derived multiplier in `[0.95, 1.05)` that is bit-for-bit reproducible
//! on any host. The contract is the canonical form, not the hash:
//!
//! ```text
//! v1|<crop>|<state>|<city>|<year>|<month>|<season>|<temperature>|<rainfall>|<supply>|<demand>|<fertilizer>
//! ```
//!
//! - strings: key-normalized (see `factors::tables::normalize_key`) and length-prefixed
//!   with their byte length, e.g. `5:wheat`, `0:` for an empty city
//! - integers: plain decimal
//! - reals: rounded to two decimals, printed with exactly two decimals; `-0.00` → `0.00`
//!
//! Digest: SHA-256 of the UTF-8 canonical string. Bucket: first 8 digest bytes as a
//! big-endian `u64`, modulo 100. Multiplier: `0.95 + bucket / 1000`.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

use crate::factors::tables::normalize_key;
use crate::request::PredictionRequest;

pub const CANONICAL_VERSION: &str = "v1";
const BUCKETS: u64 = 100;
const JITTER_FLOOR: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Jitter {
    pub canonical: String,
    /// Lowercase hex SHA-256 of `canonical`.
    pub digest: String,
    pub bucket: u8,
    pub multiplier: f64,
}

/// Canonical, order-fixed representation of a normalized request.
pub fn canonicalize(req: &PredictionRequest) -> String {
    let mut out = String::with_capacity(128);
    out.push_str(CANONICAL_VERSION);
    for s in [&req.crop_type, &req.state, &req.city] {
        push_text(&mut out, s);
    }
    let _ = write!(out, "|{}|{}", req.year, req.month);
    push_text(&mut out, &req.season);
    for x in [
        req.temperature,
        req.rainfall,
        req.supply,
        req.demand,
        req.fertilizer_usage,
    ] {
        let _ = write!(out, "|{}", fixed2(x));
    }
    out
}

pub fn jitter_for(req: &PredictionRequest) -> Jitter {
    let canonical = canonicalize(req);
    let digest = Sha256::digest(canonical.as_bytes());

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let bucket = (u64::from_be_bytes(head) % BUCKETS) as u8;

    let mut hex = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(&mut hex, "{:02x}", b);
    }

    Jitter {
        canonical,
        digest: hex,
        bucket,
        multiplier: multiplier_for_bucket(bucket),
    }
}

pub fn multiplier_for_bucket(bucket: u8) -> f64 {
    JITTER_FLOOR + f64::from(bucket) / 1000.0
}

fn push_text(out: &mut String, s: &str) {
    let norm = normalize_key(s);
    let _ = write!(out, "|{}:{}", norm.len(), norm);
}

fn fixed2(x: f64) -> String {
    let r = (x * 100.0).round() / 100.0;
    // Fold negative zero so -0.001 and 0.0 canonicalize identically.
    let r = if r == 0.0 { 0.0 } else { r };
    format!("{r:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden() -> PredictionRequest {
        PredictionRequest {
            crop_type: "Wheat".into(),
            state: "Punjab".into(),
            city: "Ludhiana".into(),
            year: 2024,
            month: 12,
            season: "Rabi".into(),
            temperature: 25.0,
            rainfall: 100.0,
            supply: 1000.0,
            demand: 800.0,
            fertilizer_usage: 50.0,
        }
    }

    #[test]
    fn canonical_form_is_pinned() {
        assert_eq!(
            canonicalize(&golden()),
            "v1|5:wheat|6:punjab|8:ludhiana|2024|12|4:rabi|25.00|100.00|1000.00|800.00|50.00"
        );
    }

    #[test]
    fn golden_digest_is_pinned() {
        let j = jitter_for(&golden());
        assert_eq!(
            j.digest,
            "e14d52a156ac37055aa29966107107b27d25b391dd9abe88fac43932cb14843c"
        );
        assert_eq!(j.bucket, 53);
        assert!((j.multiplier - 1.003).abs() < 1e-12);
    }

    #[test]
    fn canonical_form_ignores_case_and_padding() {
        let mut a = golden();
        a.crop_type = "  WHEAT ".into();
        a.city = "ludhiana".into();
        assert_eq!(canonicalize(&a), canonicalize(&golden()));
    }

    #[test]
    fn empty_city_and_negative_zero() {
        let mut r = golden();
        r.city = String::new();
        r.temperature = -0.001;
        let c = canonicalize(&r);
        assert!(c.contains("|0:|"), "{c}");
        assert!(c.contains("|0.00|100.00|"), "{c}");
    }

    #[test]
    fn length_prefix_disambiguates_separators() {
        let mut a = golden();
        a.state = "a|b".into();
        a.city = "c".into();
        let mut b = golden();
        b.state = "a".into();
        b.city = "b|c".into();
        assert_ne!(canonicalize(&a), canonicalize(&b));
    }

    #[test]
    fn same_input_same_jitter() {
        let a = jitter_for(&golden());
        let b = jitter_for(&golden());
        assert_eq!(a, b);
        assert_eq!(a.digest.len(), 64);
        assert!(a.bucket < 100);
        assert!((0.95..1.05).contains(&a.multiplier));
    }

    #[test]
    fn sha256_digest_matches_reference_vector() {
        // Known SHA-256 of "abc".
        let d = Sha256::digest(b"abc");
        assert_eq!(
            d[..4],
            [0xba, 0x78, 0x16, 0xbf],
            "sha256 implementation drifted"
        );
    }

    #[test]
    fn bucket_multiplier_range() {
        assert_eq!(multiplier_for_bucket(0), 0.95);
        assert!((multiplier_for_bucket(99) - 1.049).abs() < 1e-12);
    }
}
