// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod keys;
pub mod loader;
pub mod metrics;
pub mod prep;
pub mod ranking;
pub mod ratio_index;
pub mod render;
pub mod scene;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::error::{LoadError, SceneError};
pub use crate::keys::{key, normalize, AliasTable, CountryKey};
pub use crate::loader::{DataBundle, DataLoader};
pub use crate::scene::{RankingMode, SceneCatalog, SceneState, VisualToggles};

use tracing::info;

/// Build the full in-process app from configuration (env + `config/app.toml`).
///
/// The data bundle is not fetched here; the first scene request triggers it.
pub fn app(cfg: &config::AppConfig) -> anyhow::Result<axum::Router> {
    let state = AppState::new(cfg.loader()?, cfg.scenes()?);
    info!(
        tabular = %cfg.data.tabular,
        geo = %cfg.data.geo,
        scenes = state.scenes.scenes().len(),
        "app configured"
    );
    let mut router = api::router(state);
    if cfg.metrics_enabled {
        router = router.merge(metrics::Metrics::init()?.router());
    }
    Ok(router)
}
