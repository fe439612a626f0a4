//! Labor-gap scenes service: binary entrypoint.
//! Boots the Axum HTTP server with the configured data sources and scenes.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use labor_gap_scenes::config::AppConfig;

/// Compact tracing logs, filtered by `RUST_LOG` (default: info for this crate).
/// No-op when a subscriber is already installed by the runtime.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("labor_gap_scenes=info,loader=info,api=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::load()?;
    let router = labor_gap_scenes::app(&cfg)?;

    Ok(router.into())
}
