// src/error.rs
use thiserror::Error;

/// Failure of the data bundle as a whole.
///
/// `Clone` so a memoized failure can be handed to every waiting caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("fetching {origin} failed: {message}")]
    Fetch { origin: String, message: String },
    #[error("parsing {origin} failed: {message}")]
    Parse { origin: String, message: String },
}

impl LoadError {
    pub fn fetch(origin: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Fetch {
            origin: origin.into(),
            message: err.to_string(),
        }
    }

    pub fn parse(origin: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            origin: origin.into(),
            message: err.to_string(),
        }
    }
}

/// Rejected scene configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("scene {scene_id}: invalid colour `{value}` for {field}")]
    Colour {
        scene_id: u32,
        field: &'static str,
        value: String,
    },
    #[error("scene {scene_id}: {field} must be a finite, non-negative number (got {value})")]
    StrokeWidth {
        scene_id: u32,
        field: &'static str,
        value: f64,
    },
    #[error("scene {scene_id}: colour domain [{lo}, {hi}] must be finite and non-empty")]
    ColourDomain { scene_id: u32, lo: f64, hi: f64 },
    #[error("scene {scene_id}: annotation offset #{index} is not finite")]
    Offset { scene_id: u32, index: usize },
    #[error("scene {scene_id}: n = {n} exceeds the maximum of {max}")]
    TooMany { scene_id: u32, n: usize, max: usize },
    #[error("duplicate scene id {0}")]
    DuplicateId(u32),
    #[error("scene catalog is empty")]
    EmptyCatalog,
}
