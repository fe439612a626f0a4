//! # Render Plan
//! Everything the map front-end needs to draw one scene, derived from the
//! data bundle and a `SceneState`. Projection, path generation and callout
//! placement stay with the renderer; this module decides *what* is drawn.
//!
//! Every name lookup goes through the bundle's key function, so the renderer
//! never needs (or gets to use) its own normalization.

use serde::Serialize;

use crate::color::{LegendSpec, SequentialScale};
use crate::keys::CountryKey;
use crate::loader::DataBundle;
use crate::ranking::{Direction, RankedEntry, UNMATCHED_PROBE};
use crate::scene::SceneState;

pub const NO_DATA: &str = "no data";

/// Base layer entry, one per geographic feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub key: CountryKey,
    pub value: Option<f64>,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<Vec<String>>,
}

/// Outlined, coloured overlay for a ranked country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub key: CountryKey,
    pub value: f64,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub title: String,
    pub label: String,
    pub key: CountryKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<String>,
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenePlan {
    pub scene: SceneState,
    pub year: Option<i32>,
    pub countries: Vec<CountryStyle>,
    pub highlights: Vec<Highlight>,
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<LegendSpec>,
    /// Ranked-candidate names with no geometry (diagnostics only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<String>,
}

/// `95.2 %`
pub fn format_ratio(v: f64) -> String {
    format!("{v:.1} %")
}

/// Inputs handed to the renderer: rows, features, index, ranked subset, state.
pub struct SceneView<'a> {
    pub bundle: &'a DataBundle,
    pub scene: &'a SceneState,
    pub ranked: Vec<RankedEntry<'a>>,
}

impl<'a> SceneView<'a> {
    pub fn new(bundle: &'a DataBundle, scene: &'a SceneState) -> Self {
        Self {
            bundle,
            scene,
            ranked: bundle.rank_for(scene),
        }
    }

    pub fn plan(&self) -> ScenePlan {
        let scene = self.scene;
        let style = &scene.style;
        let toggles = scene.visual_toggles;
        let scale = SequentialScale::new(style.color_domain);
        let index = self.bundle.feature_index();

        let countries = self
            .bundle
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let key = index
                    .key_at(i)
                    .cloned()
                    .unwrap_or_else(|| self.bundle.key(&f.name));
                let value = self.bundle.ratio_index.get(&key);
                let fill = if toggles.choropleth {
                    value
                        .and_then(|v| scale.color(v))
                        .unwrap_or_else(|| style.no_data_fill.clone())
                } else {
                    style.base_fill.clone()
                };
                let tooltip = toggles.tooltip_enabled.then(|| {
                    vec![
                        f.name.clone(),
                        value.map(format_ratio).unwrap_or_else(|| NO_DATA.to_string()),
                    ]
                });
                CountryStyle {
                    id: f.id.clone(),
                    name: f.name.clone(),
                    key,
                    value,
                    fill,
                    stroke: style.base_stroke.clone(),
                    stroke_width: style.base_stroke_width,
                    tooltip,
                }
            })
            .collect();

        let highlights = self
            .ranked
            .iter()
            .enumerate()
            .filter_map(|(rank, e)| {
                let f = e.feature?;
                let value = e.ratio();
                Some(Highlight {
                    rank,
                    id: f.id.clone(),
                    name: f.name.clone(),
                    key: e.key.clone(),
                    value,
                    fill: scale.color(value).unwrap_or_else(|| style.no_data_fill.clone()),
                    stroke: style.highlight_stroke.clone(),
                    stroke_width: style.highlight_stroke_width,
                })
            })
            .collect();

        let annotations = if toggles.show_annotations {
            self.ranked
                .iter()
                .enumerate()
                .filter_map(|(i, e)| {
                    let f = e.feature?;
                    let off = scene.offset_at(i);
                    Some(Annotation {
                        title: e.record.country_name.clone(),
                        label: format_ratio(e.ratio()),
                        key: e.key.clone(),
                        feature_id: f.id.clone(),
                        dx: off.dx,
                        dy: off.dy,
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        let unmatched = match scene.rank_query() {
            Some(q) if q.n > 0 => self
                .bundle
                .unmatched(q.direction, UNMATCHED_PROBE)
                .into_iter()
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        ScenePlan {
            scene: scene.clone(),
            year: self.bundle.latest_year,
            countries,
            highlights,
            annotations,
            legend: toggles
                .legend_visible
                .then(|| LegendSpec::for_scale(&scale)),
            unmatched,
        }
    }
}

/// Ranking diagnostics for both directions, used by the data summary.
pub fn unmatched_both_ways(bundle: &DataBundle) -> (Vec<String>, Vec<String>) {
    let list = |d: Direction| {
        bundle
            .unmatched(d, UNMATCHED_PROBE)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
    };
    (list(Direction::Descending), list(Direction::Ascending))
}
