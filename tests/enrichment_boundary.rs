// tests/enrichment_boundary.rs
//
// The remote collaborator is advisory: whatever it does (answers, fails, hangs),
// the deterministic body of POST /predict stays byte-identical and only the
// diagnostic headers change.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body, Bytes},
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use tower::ServiceExt as _;

use crop_price_engine::enrich::{DynEnricher, FailingEnricher, MockEnricher, SlowEnricher};
use crop_price_engine::{router, AppState, PriceEngine};

const BODY_LIMIT: usize = 1024 * 1024;

fn payload() -> String {
    json!({
        "crop_type": "Onion",
        "state": "Maharashtra",
        "city": "Nashik",
        "year": 2025,
        "month": 3,
        "temperature": 31.0,
        "rainfall": 20.0,
        "supply": 900.0,
        "demand": 1100.0
    })
    .to_string()
}

async fn call(state: AppState, uri: &str) -> (Response, Bytes) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload()))
        .unwrap();
    let resp = router(state).oneshot(req).await.expect("oneshot");
    let (parts, body) = resp.into_parts();
    let bytes = body::to_bytes(body, BODY_LIMIT).await.expect("read body");
    (Response::from_parts(parts, Body::empty()), bytes)
}

fn with(enricher: DynEnricher, timeout_ms: u64) -> AppState {
    AppState::offline(PriceEngine::default())
        .with_enricher(enricher, Duration::from_millis(timeout_ms))
}

fn hdr<'a>(resp: &'a Response, name: &str) -> &'a str {
    resp.headers().get(name).unwrap().to_str().unwrap()
}

#[tokio::test]
async fn mock_enrichment_is_reported_but_body_is_unchanged() {
    let (base, base_body) = call(AppState::offline(PriceEngine::default()), "/predict").await;
    assert_eq!(hdr(&base, "x-enrich-reason"), "off");

    let (resp, body) = call(with(Arc::new(MockEnricher::default()), 500), "/predict").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(hdr(&resp, "x-enrich-used"), "1");
    assert_eq!(hdr(&resp, "x-enrich-reason"), "ok");
    assert_eq!(body, base_body);
}

#[tokio::test]
async fn failing_enrichment_degrades_to_deterministic() {
    let (_, base_body) = call(AppState::offline(PriceEngine::default()), "/predict").await;

    let (resp, body) = call(with(Arc::new(FailingEnricher), 500), "/predict").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(hdr(&resp, "x-enrich-used"), "0");
    assert_eq!(hdr(&resp, "x-enrich-reason"), "error");
    assert_eq!(body, base_body);
}

#[tokio::test(start_paused = true)]
async fn slow_enrichment_times_out() {
    let (_, base_body) = call(AppState::offline(PriceEngine::default()), "/predict").await;

    let (resp, body) = call(with(Arc::new(SlowEnricher), 200), "/predict").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(hdr(&resp, "x-enrich-used"), "0");
    assert_eq!(hdr(&resp, "x-enrich-reason"), "timeout");
    assert_eq!(body, base_body);
}

#[tokio::test(start_paused = true)]
async fn slow_enrichment_delays_predict_by_at_most_the_timeout() {
    let started = tokio::time::Instant::now();
    let (resp, _) = call(with(Arc::new(SlowEnricher), 250), "/predict").await;
    let waited = started.elapsed();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(waited >= Duration::from_millis(250), "{waited:?}");
    assert!(waited < Duration::from_millis(300), "{waited:?}");
}

#[tokio::test(start_paused = true)]
async fn disabled_enrichment_adds_no_wait() {
    let started = tokio::time::Instant::now();
    let (resp, _) = call(AppState::offline(PriceEngine::default()), "/predict").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn explain_carries_the_advisory_estimate() {
    let mock = MockEnricher { fixed_price: 2345.0 };
    let (resp, body) = call(with(Arc::new(mock), 500), "/predict/explain").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let v: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(v["enrichment"]["status"], "used");
    assert_eq!(v["enrichment"]["adjustment"]["remote_price"], 2345.0);
    assert_eq!(v["enrichment"]["adjustment"]["provider"], "mock");
    assert_ne!(v["result"]["predicted_price"], 2345);
}

#[tokio::test]
async fn validation_errors_skip_enrichment() {
    let req = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "crop_type": "Onion" }).to_string()))
        .unwrap();
    let state = with(Arc::new(MockEnricher::default()), 500);
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.headers().get("x-enrich-used").is_none());
}
