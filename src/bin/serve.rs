//! Standalone server: binds `HOST:PORT` (default `0.0.0.0:8001`) without Shuttle.

use crop_price_engine::config::ServiceConfig;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    crop_price_engine::telemetry::init_tracing();

    let cfg = ServiceConfig::from_env();
    let app = crop_price_engine::app().await?;

    let listener = tokio::net::TcpListener::bind(cfg.addr()).await?;
    info!(addr = %cfg.addr(), "crop price service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}
