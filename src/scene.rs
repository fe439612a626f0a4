//! # Scene State
//!
//! Fixed-shape configuration for each scroll step of the story. A scene reads
//! nothing but its own `SceneState` and the shared data bundle, so given the
//! same bundle and state the ranking and render plan are deterministic.
//!
//! - Explicit defaults for every field (serde `default`).
//! - Validated once when built or loaded (`validated`, `SceneCatalog::new`).
//! - Built-in presets hold the four scenes of the story; a TOML
//!   file with `[[scene]]` entries can replace them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::SceneError;
use crate::ranking::{Direction, RankQuery};

/// Upper bound for `n`; the world atlas has fewer than 200 countries.
pub const MAX_RANKED: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankingMode {
    #[serde(rename = "topN")]
    TopN,
    #[serde(rename = "bottomN")]
    BottomN,
    #[default]
    #[serde(rename = "none")]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualToggles {
    pub legend_visible: bool,
    pub tooltip_enabled: bool,
    pub show_annotations: bool,
    /// Colour every country by value instead of a neutral base fill.
    pub choropleth: bool,
}

impl Default for VisualToggles {
    fn default() -> Self {
        Self {
            legend_visible: true,
            tooltip_enabled: false,
            show_annotations: false,
            choropleth: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneStyle {
    pub base_fill: String,
    pub base_stroke: String,
    pub base_stroke_width: f64,
    pub highlight_stroke: String,
    pub highlight_stroke_width: f64,
    pub no_data_fill: String,
    /// `[value at yellow end, value at dark-red end]`.
    pub color_domain: [f64; 2],
}

impl Default for SceneStyle {
    fn default() -> Self {
        Self {
            base_fill: "#eeeeee".into(),
            base_stroke: "#cccccc".into(),
            base_stroke_width: 0.5,
            highlight_stroke: "#222222".into(),
            highlight_stroke_width: 1.2,
            no_data_fill: "#cccccc".into(),
            color_domain: [110.0, 40.0],
        }
    }
}

/// Callout offset from the feature centroid, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

impl Offset {
    pub const DEFAULT: Offset = Offset { dx: 35.0, dy: 30.0 };

    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneState {
    pub scene_id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ranking_mode: RankingMode,
    #[serde(default)]
    pub n: usize,
    #[serde(default)]
    pub require_geometry: bool,
    #[serde(default)]
    pub visual_toggles: VisualToggles,
    #[serde(default)]
    pub style: SceneStyle,
    #[serde(default)]
    pub annotation_offsets: Vec<Offset>,
}

impl SceneState {
    pub fn new(scene_id: u32) -> Self {
        Self {
            scene_id,
            title: String::new(),
            ranking_mode: RankingMode::None,
            n: 0,
            require_geometry: false,
            visual_toggles: VisualToggles::default(),
            style: SceneStyle::default(),
            annotation_offsets: Vec::new(),
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn ranking(mut self, mode: RankingMode, n: usize, require_geometry: bool) -> Self {
        self.ranking_mode = mode;
        self.n = n;
        self.require_geometry = require_geometry;
        self
    }

    pub fn toggles(mut self, toggles: VisualToggles) -> Self {
        self.visual_toggles = toggles;
        self
    }

    pub fn offsets(mut self, offsets: impl IntoIterator<Item = Offset>) -> Self {
        self.annotation_offsets = offsets.into_iter().collect();
        self
    }

    /// Ranking request, or `None` when the scene ranks nothing.
    pub fn rank_query(&self) -> Option<RankQuery> {
        let direction = match self.ranking_mode {
            RankingMode::TopN => Direction::Descending,
            RankingMode::BottomN => Direction::Ascending,
            RankingMode::None => return None,
        };
        Some(RankQuery {
            direction,
            n: self.n,
            require_geometry: self.require_geometry,
        })
    }

    /// Offset for the `i`-th annotation, falling back to (35, 30).
    pub fn offset_at(&self, i: usize) -> Offset {
        self.annotation_offsets
            .get(i)
            .copied()
            .unwrap_or(Offset::DEFAULT)
    }

    pub fn validated(self) -> Result<Self, SceneError> {
        let id = self.scene_id;
        let s = &self.style;
        for (field, value) in [
            ("base_fill", &s.base_fill),
            ("base_stroke", &s.base_stroke),
            ("highlight_stroke", &s.highlight_stroke),
            ("no_data_fill", &s.no_data_fill),
        ] {
            if !is_hex_colour(value) {
                return Err(SceneError::Colour {
                    scene_id: id,
                    field,
                    value: value.clone(),
                });
            }
        }
        for (field, value) in [
            ("base_stroke_width", s.base_stroke_width),
            ("highlight_stroke_width", s.highlight_stroke_width),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SceneError::StrokeWidth {
                    scene_id: id,
                    field,
                    value,
                });
            }
        }
        let [lo, hi] = s.color_domain;
        if !lo.is_finite() || !hi.is_finite() || lo == hi {
            return Err(SceneError::ColourDomain { scene_id: id, lo, hi });
        }
        if let Some(index) = self
            .annotation_offsets
            .iter()
            .position(|o| !o.dx.is_finite() || !o.dy.is_finite())
        {
            return Err(SceneError::Offset { scene_id: id, index });
        }
        if self.n > MAX_RANKED {
            return Err(SceneError::TooMany {
                scene_id: id,
                n: self.n,
                max: MAX_RANKED,
            });
        }
        Ok(self)
    }
}

fn is_hex_colour(s: &str) -> bool {
    let Some(hex) = s.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Built-in scroll sequence.
pub fn presets() -> Vec<SceneState> {
    let neutral = VisualToggles {
        legend_visible: false,
        tooltip_enabled: false,
        show_annotations: false,
        choropleth: false,
    };
    let highlight = VisualToggles {
        legend_visible: true,
        tooltip_enabled: false,
        show_annotations: true,
        choropleth: false,
    };

    let mut intro = SceneState::new(0)
        .titled("The participation gap, around the world")
        .toggles(neutral);
    intro.style.base_stroke_width = 0.7;

    let top = SceneState::new(1)
        .titled("Where the gap is smallest")
        .ranking(RankingMode::TopN, 3, false)
        .toggles(highlight)
        .offsets([
            Offset::new(35.0, -20.0),
            Offset::new(-35.0, -25.0),
            Offset::new(60.0, 30.0),
        ]);

    let bottom = SceneState::new(2)
        .titled("Where the gap is widest")
        .ranking(RankingMode::BottomN, 3, true)
        .toggles(highlight)
        .offsets([
            Offset::new(35.0, 30.0),
            Offset::new(-40.0, -30.0),
            Offset::new(0.0, -45.0),
        ]);

    let mut explore = SceneState::new(3)
        .titled("Explore every country")
        .toggles(VisualToggles {
            legend_visible: true,
            tooltip_enabled: true,
            show_annotations: false,
            choropleth: true,
        });
    explore.style.base_stroke = "#ffffff".into();

    vec![intro, top, bottom, explore]
}

/// Validated, ordered set of scenes with unique ids.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCatalog {
    scenes: Vec<SceneState>,
}

impl SceneCatalog {
    pub fn new(scenes: Vec<SceneState>) -> Result<Self, SceneError> {
        if scenes.is_empty() {
            return Err(SceneError::EmptyCatalog);
        }
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(scenes.len());
        for s in scenes {
            if !seen.insert(s.scene_id) {
                return Err(SceneError::DuplicateId(s.scene_id));
            }
            out.push(s.validated()?);
        }
        Ok(Self { scenes: out })
    }

    pub fn builtin() -> Self {
        Self {
            scenes: presets(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct File {
            scene: Vec<SceneState>,
        }
        let f: File = toml::from_str(s).context("parsing scenes toml")?;
        Ok(Self::new(f.scene)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scenes from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn get(&self, scene_id: u32) -> Option<&SceneState> {
        self.scenes.iter().find(|s| s.scene_id == scene_id)
    }

    pub fn scenes(&self) -> &[SceneState] {
        &self.scenes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        let cat = SceneCatalog::new(presets()).unwrap();
        assert_eq!(cat.scenes().len(), 4);
        assert_eq!(cat, SceneCatalog::builtin());

        let bottom = cat.get(2).unwrap();
        let q = bottom.rank_query().unwrap();
        assert_eq!(q.direction, Direction::Ascending);
        assert_eq!(q.n, 3);
        assert!(q.require_geometry);
        assert!(cat.get(0).unwrap().rank_query().is_none());
        assert!(cat.get(9).is_none());
    }

    #[test]
    fn serializes_ranking_mode_like_the_front_end_expects() {
        let v = serde_json::to_value(SceneState::new(1).ranking(RankingMode::TopN, 3, false)).unwrap();
        assert_eq!(v["ranking_mode"], "topN");
        assert_eq!(v["visual_toggles"]["legend_visible"], true);
        assert_eq!(v["style"]["color_domain"][0], 110.0);
    }

    #[test]
    fn toml_fills_defaults() {
        let toml = r#"
            [[scene]]
            scene_id = 7
            ranking_mode = "bottomN"
            n = 5

            [scene.visual_toggles]
            tooltip_enabled = true
        "#;
        let cat = SceneCatalog::from_toml_str(toml).unwrap();
        let s = cat.get(7).unwrap();
        assert_eq!(s.ranking_mode, RankingMode::BottomN);
        assert!(s.visual_toggles.tooltip_enabled);
        assert!(s.visual_toggles.legend_visible);
        assert_eq!(s.style, SceneStyle::default());
        assert_eq!(s.offset_at(0), Offset::DEFAULT);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut s = SceneState::new(4);
        s.style.base_fill = "grey".into();
        assert!(matches!(s.validated(), Err(SceneError::Colour { field: "base_fill", .. })));

        let mut s = SceneState::new(4);
        s.style.highlight_stroke_width = -1.0;
        assert!(matches!(s.validated(), Err(SceneError::StrokeWidth { .. })));

        let mut s = SceneState::new(4);
        s.style.color_domain = [50.0, 50.0];
        assert!(matches!(s.validated(), Err(SceneError::ColourDomain { .. })));

        let s = SceneState::new(4).offsets([Offset::new(f64::NAN, 0.0)]);
        assert!(matches!(s.validated(), Err(SceneError::Offset { index: 0, .. })));

        let s = SceneState::new(4).ranking(RankingMode::TopN, MAX_RANKED + 1, false);
        assert!(matches!(s.validated(), Err(SceneError::TooMany { .. })));
    }

    #[test]
    fn catalog_rejects_duplicates_and_empty() {
        let err = SceneCatalog::new(vec![SceneState::new(1), SceneState::new(1)]).unwrap_err();
        assert_eq!(err, SceneError::DuplicateId(1));
        assert_eq!(SceneCatalog::new(Vec::new()).unwrap_err(), SceneError::EmptyCatalog);
    }
}
