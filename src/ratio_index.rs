//! # Ratio Index
//! Canonical key → ratio for the latest reporting year.
//!
//! Built by walking the rows in input order and overwriting on collision, so
//! two raw names that normalize to the same key resolve last-write-wins.
//! Collisions are recorded (and logged at debug) but never treated as errors.

use metrics::counter;
use serde::Serialize;
use std::collections::HashMap;

use crate::data::RawRecord;
use crate::keys::{AliasTable, CountryKey};

/// Two raw names that landed on the same key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collision {
    pub key: CountryKey,
    pub replaced: String,
    pub winner: String,
}

#[derive(Debug, Clone, Default)]
pub struct RatioIndex {
    values: HashMap<CountryKey, (String, Option<f64>)>,
    collisions: Vec<Collision>,
}

impl RatioIndex {
    pub fn build(rows: &[RawRecord], aliases: &AliasTable) -> Self {
        let mut values: HashMap<CountryKey, (String, Option<f64>)> =
            HashMap::with_capacity(rows.len());
        let mut collisions = Vec::new();

        for row in rows {
            let k = aliases.key(&row.country_name);
            if let Some((prev, _)) = values.insert(k.clone(), (row.country_name.clone(), row.ratio)) {
                tracing::debug!(
                    target: "ratio_index",
                    key = %k,
                    replaced = %prev,
                    winner = %row.country_name,
                    "key collision, last row wins"
                );
                collisions.push(Collision {
                    key: k,
                    replaced: prev,
                    winner: row.country_name.clone(),
                });
            }
        }

        if !collisions.is_empty() {
            counter!("ratio_index_collisions_total").increment(collisions.len() as u64);
        }
        Self { values, collisions }
    }

    /// Finite ratio for `key`; `None` for absent, missing or non-finite values.
    pub fn get(&self, key: &CountryKey) -> Option<f64> {
        self.values
            .get(key)
            .and_then(|(_, v)| *v)
            .filter(|v| v.is_finite())
    }

    /// True for every key in the subset, even when its ratio is missing.
    pub fn contains(&self, key: &CountryKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::key;

    fn aliases() -> AliasTable {
        AliasTable::default_seed()
    }

    #[test]
    fn size_counts_distinct_keys_not_rows() {
        let rows = vec![
            RawRecord::new("Côte d'Ivoire", 2021, Some(80.0)),
            RawRecord::new("Cote dIvoire", 2021, Some(81.0)),
            RawRecord::new("Ivory Coast", 2021, Some(82.0)),
            RawRecord::new("Qatar", 2021, Some(95.2)),
        ];
        let idx = RatioIndex::build(&rows, &aliases());
        assert_eq!(idx.len(), 2);
        assert_eq!(idx.collisions().len(), 2);
    }

    #[test]
    fn collision_is_last_write_wins() {
        let rows = vec![
            RawRecord::new("Ivory Coast", 2021, Some(10.0)),
            RawRecord::new("Côte d'Ivoire", 2021, Some(20.0)),
        ];
        let idx = RatioIndex::build(&rows, &aliases());
        assert_eq!(idx.get(&key("Cote d'Ivoire")), Some(20.0));
        let c = &idx.collisions()[0];
        assert_eq!(c.replaced, "Ivory Coast");
        assert_eq!(c.winner, "Côte d'Ivoire");

        let reversed: Vec<_> = rows.into_iter().rev().collect();
        let idx = RatioIndex::build(&reversed, &aliases());
        assert_eq!(idx.get(&key("Cote d'Ivoire")), Some(10.0));
    }

    #[test]
    fn non_finite_values_keep_an_entry() {
        let rows = vec![
            RawRecord::new("Chad", 2021, Some(f64::NAN)),
            RawRecord::new("Mali", 2021, None),
        ];
        let idx = RatioIndex::build(&rows, &aliases());
        assert_eq!(idx.len(), 2);
        assert!(idx.contains(&key("Chad")));
        assert_eq!(idx.get(&key("Chad")), None);
        assert_eq!(idx.get(&key("Mali")), None);
        assert_eq!(idx.get(&key("")), None);
    }
}
