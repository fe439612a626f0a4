// tests/ranking.rs
//
// Ranking over an assembled bundle: ordering, ties, geometry filtering.

use std::sync::Arc;

use labor_gap_scenes::data::{GeoFeature, RawRecord};
use labor_gap_scenes::keys::AliasTable;
use labor_gap_scenes::ranking::{Direction, RankQuery};
use labor_gap_scenes::DataBundle;

fn bundle(rows: Vec<RawRecord>, features: &[&str]) -> DataBundle {
    DataBundle::assemble(
        rows,
        features.iter().map(|n| GeoFeature::named(*n)).collect(),
        Arc::new(AliasTable::default_seed()),
    )
}

fn names(b: &DataBundle, q: RankQuery) -> Vec<String> {
    b.rank(q).iter().map(|e| e.record.country_name.clone()).collect()
}

#[test]
fn ties_keep_input_order() {
    let b = bundle(
        vec![
            RawRecord::new("A", 2021, Some(50.0)),
            RawRecord::new("B", 2021, Some(60.0)),
            RawRecord::new("C", 2021, Some(40.0)),
            RawRecord::new("D", 2021, Some(40.0)),
        ],
        &["A", "B", "C", "D"],
    );
    let q = RankQuery {
        direction: Direction::Ascending,
        n: 3,
        require_geometry: false,
    };
    assert_eq!(names(&b, q), vec!["C", "D", "A"]);

    let q = RankQuery {
        direction: Direction::Descending,
        ..q
    };
    assert_eq!(names(&b, q), vec!["B", "A", "C"]);
}

#[test]
fn descending_ties_keep_input_order() {
    let b = bundle(
        vec![
            RawRecord::new("A", 2021, Some(90.0)),
            RawRecord::new("B", 2021, Some(70.0)),
            RawRecord::new("C", 2021, Some(100.0)),
            RawRecord::new("D", 2021, Some(100.0)),
        ],
        &["A", "B", "C", "D"],
    );
    let q = RankQuery {
        direction: Direction::Descending,
        n: 3,
        require_geometry: false,
    };
    assert_eq!(names(&b, q), vec!["C", "D", "A"]);
}

#[test]
fn missing_and_non_finite_ratios_never_rank() {
    let b = bundle(
        vec![
            RawRecord::new("A", 2021, Some(f64::NAN)),
            RawRecord::new("B", 2021, None),
            RawRecord::new("C", 2021, Some(f64::INFINITY)),
            RawRecord::new("D", 2021, Some(12.0)),
        ],
        &[],
    );
    let q = RankQuery {
        direction: Direction::Descending,
        n: 10,
        require_geometry: false,
    };
    assert_eq!(names(&b, q), vec!["D"]);
}

#[test]
fn require_geometry_backfills_with_next_best() {
    let b = bundle(
        vec![
            RawRecord::new("Tuvalu", 2021, Some(10.0)),
            RawRecord::new("Yemen, Rep.", 2021, Some(7.8)),
            RawRecord::new("Chad", 2021, Some(70.0)),
            RawRecord::new("Mali", 2021, Some(60.0)),
        ],
        &["Yemen", "Chad", "Mali"],
    );
    let q = RankQuery {
        direction: Direction::Ascending,
        n: 2,
        require_geometry: true,
    };
    let ranked = b.rank(q);
    let got: Vec<_> = ranked.iter().map(|e| e.record.country_name.as_str()).collect();
    assert_eq!(got, vec!["Yemen, Rep.", "Mali"]);
    assert!(ranked.iter().all(|e| e.feature.is_some()));
    assert_eq!(ranked[0].feature.unwrap().name, "Yemen");

    let q = RankQuery {
        require_geometry: false,
        ..q
    };
    let loose = b.rank(q);
    assert_eq!(loose[1].record.country_name, "Tuvalu");
    assert!(loose[1].feature.is_none());
    assert_eq!(b.unmatched(Direction::Ascending, 10), vec!["Tuvalu"]);
}

#[test]
fn n_zero_and_n_past_the_end() {
    let b = bundle(vec![RawRecord::new("A", 2021, Some(1.0))], &["A"]);
    let zero = RankQuery {
        direction: Direction::Descending,
        n: 0,
        require_geometry: false,
    };
    assert!(b.rank(zero).is_empty());
    let many = RankQuery { n: 50, ..zero };
    assert_eq!(b.rank(many).len(), 1);
}
