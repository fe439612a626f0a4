//! # Ranking Engine
//! Pure top-N / bottom-N selection over the latest-period rows.
//!
//! Policy: rows without a finite ratio never rank; ordering is a stable sort
//! so ties keep their input order; with `require_geometry` rows lacking a
//! feature are skipped *before* truncation so the next-best row moves up.

use serde::{Deserialize, Serialize};

use crate::data::{FeatureIndex, GeoFeature, RawRecord};
use crate::keys::{AliasTable, CountryKey};

/// How many unmatched names the diagnostic listing looks at.
pub const UNMATCHED_PROBE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Lowest first (bottom-N).
    Ascending,
    /// Highest first (top-N).
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankQuery {
    pub direction: Direction,
    pub n: usize,
    pub require_geometry: bool,
}

/// A selected row and its matched feature, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry<'a> {
    #[serde(flatten)]
    pub record: &'a RawRecord,
    pub key: CountryKey,
    pub feature: Option<&'a GeoFeature>,
}

impl RankedEntry<'_> {
    /// Ranked rows always carry a finite ratio.
    pub fn ratio(&self) -> f64 {
        self.record.finite_ratio().unwrap_or(f64::NAN)
    }
}

/// Join context shared by every ranking call on one bundle.
#[derive(Clone, Copy)]
pub struct Catalog<'a> {
    pub features: &'a [GeoFeature],
    pub index: &'a FeatureIndex,
    pub aliases: &'a AliasTable,
}

impl<'a> Catalog<'a> {
    fn feature_for(&self, key: &CountryKey) -> Option<&'a GeoFeature> {
        self.index.position(key).and_then(|i| self.features.get(i))
    }
}

/// Finite rows sorted in `direction`, ties in input order.
fn sorted<'a>(rows: &'a [RawRecord], direction: Direction) -> Vec<(&'a RawRecord, f64)> {
    let mut eligible: Vec<(&RawRecord, f64)> = rows
        .iter()
        .filter_map(|r| r.finite_ratio().map(|v| (r, v)))
        .collect();
    // `sort_by` is stable; equal ratios keep their relative order.
    match direction {
        Direction::Ascending => eligible.sort_by(|a, b| a.1.total_cmp(&b.1)),
        Direction::Descending => eligible.sort_by(|a, b| b.1.total_cmp(&a.1)),
    }
    eligible
}

pub fn rank<'a>(rows: &'a [RawRecord], query: RankQuery, catalog: Catalog<'a>) -> Vec<RankedEntry<'a>> {
    if query.n == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(query.n.min(rows.len()));
    for (record, _) in sorted(rows, query.direction) {
        if out.len() == query.n {
            break;
        }
        let key = catalog.aliases.key(&record.country_name);
        let feature = catalog.feature_for(&key);
        if query.require_geometry && feature.is_none() {
            continue;
        }
        out.push(RankedEntry { record, key, feature });
    }
    out
}

/// Names among the first `limit` ranked rows that have no matching feature.
/// Developer diagnostics only; a missing match is not an error.
pub fn unmatched_candidates<'a>(
    rows: &'a [RawRecord],
    direction: Direction,
    limit: usize,
    catalog: Catalog<'a>,
) -> Vec<&'a str> {
    let missing: Vec<&str> = sorted(rows, direction)
        .into_iter()
        .take(limit)
        .filter(|(r, _)| !catalog.index.contains(&catalog.aliases.key(&r.country_name)))
        .map(|(r, _)| r.country_name.as_str())
        .collect();
    if !missing.is_empty() {
        tracing::debug!(target: "ranking", ?direction, missing = ?missing, "no geometry for ranked rows");
    }
    missing
}
