//! Crop Price Engine: Shuttle entrypoint.
//! Boots the Axum router (prediction routes + `/metrics`) inside the Shuttle runtime.
//!
//! For a plain `HOST:PORT` listener use the `serve` binary instead.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    crop_price_engine::telemetry::init_tracing();

    let router = crop_price_engine::app()
        .await
        .map_err(shuttle_runtime::Error::Custom)?;

    Ok(router.into())
}
