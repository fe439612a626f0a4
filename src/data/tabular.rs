// src/data/tabular.rs
//! Long-format CSV reader: `Country Name, [Country Code,] Year, Ratio`.
//!
//! Cell coercion: empty or `..` ratio is missing, anything `f64` can parse is
//! kept (including `NaN`/`inf`), anything else is missing. Rows without a
//! usable year are dropped and counted; they never fail the load.

use csv::{ReaderBuilder, StringRecord, Trim};
use metrics::counter;

use crate::data::RawRecord;
use crate::error::LoadError;

pub const COL_NAME: &str = "Country Name";
pub const COL_CODE: &str = "Country Code";
pub const COL_YEAR: &str = "Year";
pub const COL_RATIO: &str = "Ratio";

struct Columns {
    name: usize,
    code: Option<usize>,
    year: usize,
    ratio: usize,
}

impl Columns {
    fn locate(headers: &StringRecord, origin: &str) -> Result<Self, LoadError> {
        let find = |col: &str| headers.iter().position(|h| h.trim() == col);
        let need = |col: &str| {
            find(col).ok_or_else(|| LoadError::parse(origin, format!("missing column `{col}`")))
        };
        Ok(Self {
            name: need(COL_NAME)?,
            code: find(COL_CODE),
            year: need(COL_YEAR)?,
            ratio: need(COL_RATIO)?,
        })
    }
}

/// Parse CSV text into records, dropping malformed rows.
pub fn parse_csv(origin: &str, text: &str) -> Result<Vec<RawRecord>, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| LoadError::parse(origin, e))?
        .clone();
    let cols = Columns::locate(&headers, origin)?;

    let mut out = Vec::new();
    let mut dropped = 0u64;
    for rec in rdr.records() {
        let rec = match rec {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(target: "tabular", error = %e, origin, "unreadable row dropped");
                dropped += 1;
                continue;
            }
        };
        let Some(year) = rec.get(cols.year).and_then(parse_year) else {
            dropped += 1;
            continue;
        };
        let code = cols
            .code
            .and_then(|i| rec.get(i))
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        out.push(RawRecord {
            country_name: rec.get(cols.name).unwrap_or_default().to_string(),
            country_code: code,
            year,
            ratio: rec.get(cols.ratio).and_then(parse_ratio),
        });
    }

    if dropped > 0 {
        counter!("tabular_rows_dropped_total").increment(dropped);
        tracing::debug!(target: "tabular", dropped, origin, "malformed rows dropped");
    }
    Ok(out)
}

fn parse_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    if let Ok(y) = cell.parse::<i32>() {
        return Some(y);
    }
    // "2021.0" from spreadsheet exports
    let f = cell.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i32::MAX as f64).then_some(f as i32)
}

pub(crate) fn parse_ratio(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell == ".." {
        return None;
    }
    cell.parse::<f64>().ok()
}
