// tests/determinism.rs
//
// Same normalized input → byte-identical output, across engine instances,
// concurrent callers, and cosmetic input variations.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::{json, Value};

use crop_price_engine::jitter;
use crop_price_engine::request::season_for_month;
use crop_price_engine::{FactorTables, PredictionRequest, PriceEngine};

const CROPS: &[&str] = &[
    "Rice", "Wheat", "Maize", "Pulses", "Cotton", "Onion", "Quinoa", "Saffron",
];
const STATES: &[(&str, &str)] = &[
    ("Punjab", "Ludhiana"),
    ("Punjab", ""),
    ("Maharashtra", "Pune"),
    ("Karnataka", "Bengaluru"),
    ("Kerala", "Kochi"),
    ("Atlantis", ""),
];

fn random_request(rng: &mut StdRng) -> PredictionRequest {
    let month = rng.random_range(1..=12u32);
    let (state, city) = STATES[rng.random_range(0..STATES.len())];
    PredictionRequest {
        crop_type: CROPS[rng.random_range(0..CROPS.len())].to_string(),
        state: state.to_string(),
        city: city.to_string(),
        year: rng.random_range(1990..=2040),
        month,
        season: season_for_month(month).to_string(),
        temperature: rng.random_range(-5.0..50.0),
        rainfall: rng.random_range(0.0..400.0),
        supply: rng.random_range(0.0..5000.0),
        demand: rng.random_range(0.0..5000.0),
        fertilizer_usage: rng.random_range(0.0..200.0),
    }
}

#[test]
fn two_engines_produce_identical_json() {
    let a = PriceEngine::new(FactorTables::builtin());
    let b = PriceEngine::new(FactorTables::builtin());
    let mut rng = StdRng::seed_from_u64(0x5eed_c0de);

    for _ in 0..500 {
        let req = random_request(&mut rng);
        let ja = serde_json::to_string(&a.predict(&req)).unwrap();
        let jb = serde_json::to_string(&b.predict(&req)).unwrap();
        assert_eq!(ja, jb, "divergent output for {req:?}");
    }
}

#[test]
fn repeated_calls_are_stable() {
    let engine = PriceEngine::default();
    let mut rng = StdRng::seed_from_u64(7);
    let req = random_request(&mut rng);
    let first = engine.predict(&req);
    for _ in 0..50 {
        assert_eq!(engine.predict(&req), first);
    }
}

#[test]
fn cosmetic_variations_share_a_digest() {
    let engine = PriceEngine::default();
    let base = json!({
        "crop_type": "Wheat", "state": "Punjab", "city": "Ludhiana",
        "year": 2024, "month": 12, "season": "Rabi",
        "temperature": 25.0, "rainfall": 100.0,
        "supply": 1000.0, "demand": 800.0, "fertilizer_usage": 50.0
    });
    let variant = json!({
        "crop_type": "  WHEAT ", "state": "punjab", "city": "LUDHIANA",
        "year": "2024", "month": 12.0, "season": "rabi",
        "temperature": "25", "rainfall": 100, "supply": 1000,
        "demand": 800.001, "fertilizer_usage": 50
    });

    let a = engine.predict_json(&base).unwrap();
    let b = engine.predict_json(&variant).unwrap();
    assert_eq!(a.breakdown.input_digest, b.breakdown.input_digest);
    assert_eq!(a.result.predicted_price, b.result.predicted_price);
}

#[test]
fn golden_digest_and_bucket_are_pinned() {
    let req = PredictionRequest::from_json(&json!({
        "crop_type": "Wheat", "state": "Punjab", "city": "Ludhiana",
        "year": 2024, "month": 12, "season": "Rabi",
        "temperature": 25.0, "rainfall": 100.0,
        "supply": 1000.0, "demand": 800.0, "fertilizer_usage": 50.0
    }))
    .unwrap();
    let j = jitter::jitter_for(&req);
    assert_eq!(
        j.digest,
        "e14d52a156ac37055aa29966107107b27d25b391dd9abe88fac43932cb14843c"
    );
    assert_eq!(j.bucket, 53);
}

#[test]
fn omitted_season_matches_explicit_calendar_season() {
    let engine = PriceEngine::default();
    let mut explicit: Value = json!({
        "crop_type": "Rice", "state": "Karnataka", "year": 2024, "month": 8
    });
    let implicit = explicit.clone();
    explicit["season"] = json!("Kharif");

    assert_eq!(
        engine.predict_json(&explicit).unwrap(),
        engine.predict_json(&implicit).unwrap()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_agree() {
    let engine = PriceEngine::default();
    let mut rng = StdRng::seed_from_u64(42);
    let req = random_request(&mut rng);
    let expected = engine.predict(&req);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = engine.clone();
        let req = req.clone();
        handles.push(tokio::spawn(async move { engine.predict(&req) }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap(), expected);
    }
}
