// tests/metrics.rs
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serial_test::serial;
use tower::ServiceExt;

// Build full in-process app (prediction routes + /metrics).
async fn build_app() -> Router {
    // Mock enrichment keeps /predict deterministic and offline.
    std::env::set_var("ENRICH_TEST_MODE", "mock");
    crop_price_engine::app()
        .await
        .expect("app() should build Router in tests")
}

fn predict_request(body: &str) -> Request<Body> {
    Request::post("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn scrape(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
#[serial]
async fn metrics_endpoint_exposes_prediction_series() {
    let app = build_app().await;

    let resp = app
        .clone()
        .oneshot(predict_request(
            r#"{"crop_type":"Saffron","state":"Punjab","city":"Nowhere","year":2024,"month":1}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let text = scrape(&app).await;
    assert!(text.contains("price_predictions_total"), "{text}");
    assert!(text.contains("price_predict_duration_ms"), "{text}");
    assert!(text.contains(r#"price_fallback_total{kind="unknown_crop"}"#), "{text}");
    assert!(text.contains(r#"price_enrichment_total{outcome="ok"}"#), "{text}");
}

#[tokio::test]
#[serial]
async fn validation_failures_are_counted() {
    let app = build_app().await;

    let resp = app
        .clone()
        .oneshot(predict_request(r#"{"crop_type":"Rice"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let text = scrape(&app).await;
    assert!(text.contains("price_validation_failures_total"), "{text}");
}

#[tokio::test]
#[serial]
async fn app_can_be_built_twice_in_one_process() {
    let a = build_app().await;
    let b = build_app().await;
    // Both routers share the one global recorder.
    scrape(&a).await;
    scrape(&b).await;
}
