// src/prep.rs
//! Reshape the World Bank wide export into the long CSV the loader reads.
//!
//! Keeps one series (female-to-male labour-force participation ratio),
//! turns every year column into its own row, drops `..`/empty cells, and
//! writes `Country Name,Country Code,Year,Ratio` in year-major order.

use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::data::tabular::{parse_ratio, COL_CODE, COL_NAME, COL_RATIO, COL_YEAR};

pub const SERIES_ID: &str = "SL.TLF.CACT.FM.ZS";
pub const DEFAULT_RAW_PATH: &str = "data/raw_female_labor_data2.csv";
pub const DEFAULT_OUT_PATH: &str = "data/labor_gap_long.csv";
pub const DEFAULT_YEARS: RangeInclusive<i32> = 2016..=2024;

const COL_SERIES_CODE: &str = "Series Code";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepOptions {
    pub series_id: String,
    pub years: RangeInclusive<i32>,
}

impl Default for PrepOptions {
    fn default() -> Self {
        Self {
            series_id: SERIES_ID.to_string(),
            years: DEFAULT_YEARS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TidyRow {
    pub country_name: String,
    pub country_code: String,
    pub year: i32,
    pub ratio: f64,
}

/// Year encoded in a header: `2016` or `2016 [YR2016]`.
fn header_year(h: &str) -> Option<i32> {
    let h = h.trim();
    let digits = h.get(..4)?;
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match h[4..].chars().next() {
        None | Some(' ') | Some('[') => digits.parse().ok(),
        _ => None,
    }
}

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| anyhow!("raw file has no `{name}` column"))
}

/// Melt the wide table. Rows are emitted year-major: every country for the
/// first year column, then every country for the next.
pub fn melt(raw: &str, opts: &PrepOptions) -> Result<Vec<TidyRow>> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(raw.as_bytes());
    let headers = rdr.headers().context("reading raw header")?.clone();

    let name_col = column(&headers, COL_NAME)?;
    let code_col = column(&headers, COL_CODE)?;
    let series_col = column(&headers, COL_SERIES_CODE)?;
    let year_cols: Vec<(usize, i32)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| header_year(h).map(|y| (i, y)))
        .filter(|(_, y)| opts.years.contains(y))
        .collect();
    if year_cols.is_empty() {
        bail!("raw file has no year columns in {:?}", opts.years);
    }

    let mut series_rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec.context("reading raw row")?;
        if rec.get(series_col) == Some(opts.series_id.as_str()) {
            series_rows.push(rec);
        }
    }

    let mut out = Vec::new();
    for &(col, year) in &year_cols {
        for rec in &series_rows {
            let Some(ratio) = rec.get(col).and_then(parse_ratio) else {
                continue;
            };
            out.push(TidyRow {
                country_name: rec.get(name_col).unwrap_or_default().to_string(),
                country_code: rec.get(code_col).unwrap_or_default().to_string(),
                year,
                ratio,
            });
        }
    }
    Ok(out)
}

pub fn to_csv(rows: &[TidyRow]) -> Result<String> {
    let mut w = WriterBuilder::new().from_writer(Vec::new());
    w.write_record([COL_NAME, COL_CODE, COL_YEAR, COL_RATIO])?;
    for r in rows {
        w.write_record([
            r.country_name.as_str(),
            r.country_code.as_str(),
            &r.year.to_string(),
            &r.ratio.to_string(),
        ])?;
    }
    let bytes = w.into_inner().map_err(|e| anyhow!("flushing csv: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

/// Read `raw_path`, write the long CSV to `out_path`, return the row count.
pub fn run(raw_path: &Path, out_path: &Path, opts: &PrepOptions) -> Result<usize> {
    if !raw_path.exists() {
        bail!("input file not found: {}", raw_path.display());
    }
    let raw = fs::read_to_string(raw_path)
        .with_context(|| format!("reading {}", raw_path.display()))?;
    let rows = melt(&raw, opts)?;

    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(out_path, to_csv(&rows)?).with_context(|| format!("writing {}", out_path.display()))?;
    tracing::info!(target: "prep", rows = rows.len(), out = %out_path.display(), "wrote long csv");
    Ok(rows.len())
}
