use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "crop_price_engine=info,warn";

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
/// `LOG_FORMAT=json` switches to JSON lines; otherwise compact text.
///
/// Uses `try_init`: when a runtime (e.g. Shuttle) already installed a global
/// subscriber, that one wins and this is a no-op.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("global tracing subscriber already set; keeping it");
    }
}
