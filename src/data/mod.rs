// src/data/mod.rs
pub mod geo;
pub mod source;
pub mod tabular;

use serde::{Deserialize, Serialize};

pub use geo::{FeatureIndex, GeoFeature, Geometry, GeometryKind};
pub use source::{CsvSource, GeoSource, HttpTimeouts, Origin, TabularSource, TopoJsonSource};

/// One row of the long-format dataset. Several rows per country, one per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub country_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    pub year: i32,
    /// `None` when the source cell was empty or unparsable. May be non-finite.
    pub ratio: Option<f64>,
}

impl RawRecord {
    pub fn new(country_name: impl Into<String>, year: i32, ratio: Option<f64>) -> Self {
        Self {
            country_name: country_name.into(),
            country_code: None,
            year,
            ratio,
        }
    }

    /// Ratio if present and finite.
    pub fn finite_ratio(&self) -> Option<f64> {
        self.ratio.filter(|v| v.is_finite())
    }
}

/// Rows of the most recent reporting year.
///
/// Same exact `country_name` twice in that year: the later row's values
/// replace the earlier one, keeping the earlier position.
pub fn latest_period(rows: &[RawRecord]) -> (Option<i32>, Vec<RawRecord>) {
    let Some(latest_year) = rows.iter().map(|r| r.year).max() else {
        return (None, Vec::new());
    };

    let mut out: Vec<RawRecord> = Vec::new();
    let mut pos: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for r in rows.iter().filter(|r| r.year == latest_year) {
        match pos.get(r.country_name.as_str()) {
            Some(&i) => out[i] = r.clone(),
            None => {
                pos.insert(r.country_name.as_str(), out.len());
                out.push(r.clone());
            }
        }
    }
    (Some(latest_year), out)
}
