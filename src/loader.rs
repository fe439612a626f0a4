// src/loader.rs
//! Data Loader: fetch both datasets concurrently, reduce to the latest
//! reporting year, build the join structures, and memoize the result.
//!
//! State machine: `Unstarted → Pending → Resolved | Failed`. Callers arriving
//! while a fetch is pending await the same shared future; after it settles
//! every caller gets the same `Arc<DataBundle>` (or the same error) without
//! another fetch. Nothing retries on its own; `invalidate` resets to
//! `Unstarted`.

use futures::future::{BoxFuture, FutureExt, Shared};
use metrics::{counter, histogram};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::data::{latest_period, FeatureIndex, GeoFeature, GeoSource, RawRecord, TabularSource};
use crate::error::LoadError;
use crate::keys::{AliasTable, CountryKey};
use crate::ranking::{self, Catalog, Direction, RankQuery, RankedEntry};
use crate::ratio_index::RatioIndex;
use crate::scene::SceneState;

/// Resolved, immutable inputs for every scene.
#[derive(Debug)]
pub struct DataBundle {
    pub latest_rows: Vec<RawRecord>,
    pub latest_year: Option<i32>,
    pub features: Vec<GeoFeature>,
    pub ratio_index: RatioIndex,
    feature_index: FeatureIndex,
    aliases: Arc<AliasTable>,
}

impl DataBundle {
    /// Synchronous join/index step run once both sources have resolved.
    pub fn assemble(rows: Vec<RawRecord>, features: Vec<GeoFeature>, aliases: Arc<AliasTable>) -> Self {
        let (latest_year, latest_rows) = latest_period(&rows);
        let ratio_index = RatioIndex::build(&latest_rows, &aliases);
        let feature_index = FeatureIndex::build(&features, &aliases);
        info!(
            target: "loader",
            year = ?latest_year,
            rows = rows.len(),
            latest = latest_rows.len(),
            indexed = ratio_index.len(),
            features = features.len(),
            "data bundle assembled"
        );
        Self {
            latest_rows,
            latest_year,
            features,
            ratio_index,
            feature_index,
            aliases,
        }
    }

    /// The crate-wide join key, bound to this bundle's alias table.
    pub fn key(&self, name: &str) -> CountryKey {
        self.aliases.key(name)
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn feature_index(&self) -> &FeatureIndex {
        &self.feature_index
    }

    pub fn catalog(&self) -> Catalog<'_> {
        Catalog {
            features: &self.features,
            index: &self.feature_index,
            aliases: &self.aliases,
        }
    }

    /// Finite ratio for a display name, through the shared key function.
    pub fn ratio_for(&self, name: &str) -> Option<f64> {
        self.ratio_index.get(&self.key(name))
    }

    pub fn feature_for(&self, name: &str) -> Option<&GeoFeature> {
        self.feature_index
            .position(&self.key(name))
            .and_then(|i| self.features.get(i))
    }

    pub fn rank(&self, query: RankQuery) -> Vec<RankedEntry<'_>> {
        ranking::rank(&self.latest_rows, query, self.catalog())
    }

    /// Ranked subset for a scene; empty when the scene ranks nothing.
    pub fn rank_for(&self, scene: &SceneState) -> Vec<RankedEntry<'_>> {
        match scene.rank_query() {
            Some(q) => self.rank(q),
            None => Vec::new(),
        }
    }

    pub fn unmatched(&self, direction: Direction, limit: usize) -> Vec<&str> {
        ranking::unmatched_candidates(&self.latest_rows, direction, limit, self.catalog())
    }
}

type BundleResult = Result<Arc<DataBundle>, LoadError>;
type PendingLoad = Shared<BoxFuture<'static, BundleResult>>;

enum LoadState {
    Unstarted,
    Pending(PendingLoad),
    Resolved(Arc<DataBundle>),
    Failed(LoadError),
}

/// Memoizing loader shared by every scene (hand it around as `Arc<DataLoader>`).
pub struct DataLoader {
    tabular: Arc<dyn TabularSource>,
    geo: Arc<dyn GeoSource>,
    aliases: Arc<AliasTable>,
    state: Mutex<LoadState>,
}

impl DataLoader {
    pub fn new(tabular: Arc<dyn TabularSource>, geo: Arc<dyn GeoSource>, aliases: Arc<AliasTable>) -> Self {
        Self {
            tabular,
            geo,
            aliases,
            state: Mutex::new(LoadState::Unstarted),
        }
    }

    /// Resolve the bundle, fetching at most once per loader lifetime
    /// (or once per `invalidate`).
    pub async fn load(&self) -> BundleResult {
        let pending = {
            let mut state = self.state.lock();
            let in_flight = match &*state {
                LoadState::Resolved(b) => return Ok(b.clone()),
                LoadState::Failed(e) => return Err(e.clone()),
                LoadState::Pending(f) => Some(f.clone()),
                LoadState::Unstarted => None,
            };
            match in_flight {
                Some(f) => f,
                None => {
                    let f = self.start();
                    *state = LoadState::Pending(f.clone());
                    f
                }
            }
        };

        let out = pending.clone().await;

        {
            let mut state = self.state.lock();
            // Only settle the load we awaited; an `invalidate` in between wins.
            let settles = matches!(&*state, LoadState::Pending(current) if current.ptr_eq(&pending));
            if settles {
                *state = match &out {
                    Ok(b) => LoadState::Resolved(b.clone()),
                    Err(e) => LoadState::Failed(e.clone()),
                };
            }
        }
        out
    }

    /// Drop the memoized result; the next `load` fetches again.
    pub fn invalidate(&self) {
        *self.state.lock() = LoadState::Unstarted;
        info!(target: "loader", "data bundle invalidated");
    }

    /// Resolved bundle without triggering a fetch.
    pub fn peek(&self) -> Option<Arc<DataBundle>> {
        match &*self.state.lock() {
            LoadState::Resolved(b) => Some(b.clone()),
            _ => None,
        }
    }

    fn start(&self) -> PendingLoad {
        let tabular = self.tabular.clone();
        let geo = self.geo.clone();
        let aliases = self.aliases.clone();
        info!(target: "loader", tabular = tabular.name(), geo = geo.name(), "fetching data sources");

        async move {
            let t0 = std::time::Instant::now();
            let fetched = tokio::try_join!(tabular.fetch_rows(), geo.fetch_features());
            let out = fetched.map(|(rows, features)| Arc::new(DataBundle::assemble(rows, features, aliases)));
            match &out {
                Ok(_) => {
                    histogram!("loader_load_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                }
                Err(e) => {
                    warn!(target: "loader", error = %e, "data bundle failed to load");
                    counter!("loader_failures_total").increment(1);
                }
            }
            out
        }
        .boxed()
        .shared()
    }
}
