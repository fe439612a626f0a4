use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::error::LoadError;
use crate::loader::DataLoader;
use crate::ratio_index::Collision;
use crate::render::{unmatched_both_ways, ScenePlan, SceneView};
use crate::scene::{SceneCatalog, SceneState};

#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<DataLoader>,
    pub scenes: Arc<SceneCatalog>,
}

impl AppState {
    pub fn new(loader: DataLoader, scenes: SceneCatalog) -> Self {
        Self {
            loader: Arc::new(loader),
            scenes: Arc::new(scenes),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/scenes", get(list_scenes))
        .route("/scenes/{id}", get(scene_plan))
        .route("/scenes/{id}/ranking", get(scene_ranking))
        .route("/data/summary", get(data_summary))
        .route("/admin/reload-data", post(admin_reload_data))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    UnknownScene(u32),
    Load(LoadError),
}

impl From<LoadError> for ApiError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            Self::UnknownScene(id) => (StatusCode::NOT_FOUND, format!("unknown scene {id}")),
            Self::Load(e) => {
                tracing::warn!(target: "api", error = %e, "data unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

fn scene(state: &AppState, id: u32) -> Result<SceneState, ApiError> {
    state
        .scenes
        .get(id)
        .cloned()
        .ok_or(ApiError::UnknownScene(id))
}

async fn list_scenes(State(state): State<AppState>) -> Json<Vec<SceneState>> {
    counter!("api_requests_total", "route" => "scenes").increment(1);
    Json(state.scenes.scenes().to_vec())
}

async fn scene_plan(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<ScenePlan>, ApiError> {
    counter!("api_requests_total", "route" => "scene_plan").increment(1);
    let scene = scene(&state, id)?;
    let bundle = state.loader.load().await?;
    let plan = SceneView::new(&bundle, &scene).plan();
    Ok(Json(plan))
}

async fn scene_ranking(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Value>, ApiError> {
    counter!("api_requests_total", "route" => "scene_ranking").increment(1);
    let scene = scene(&state, id)?;
    let bundle = state.loader.load().await?;
    let ranked = bundle.rank_for(&scene);
    Ok(Json(json!({
        "scene_id": scene.scene_id,
        "year": bundle.latest_year,
        "ranked": ranked,
    })))
}

#[derive(serde::Serialize)]
struct DataSummary {
    latest_year: Option<i32>,
    rows: usize,
    features: usize,
    indexed: usize,
    collisions: Vec<Collision>,
    unmatched_top: Vec<String>,
    unmatched_bottom: Vec<String>,
}

async fn data_summary(State(state): State<AppState>) -> Result<Json<DataSummary>, ApiError> {
    counter!("api_requests_total", "route" => "data_summary").increment(1);
    let bundle = state.loader.load().await?;
    let (unmatched_top, unmatched_bottom) = unmatched_both_ways(&bundle);
    Ok(Json(DataSummary {
        latest_year: bundle.latest_year,
        rows: bundle.latest_rows.len(),
        features: bundle.features.len(),
        indexed: bundle.ratio_index.len(),
        collisions: bundle.ratio_index.collisions().to_vec(),
        unmatched_top,
        unmatched_bottom,
    }))
}

async fn admin_reload_data(State(state): State<AppState>) -> &'static str {
    counter!("api_requests_total", "route" => "reload").increment(1);
    state.loader.invalidate();
    "reloaded"
}
