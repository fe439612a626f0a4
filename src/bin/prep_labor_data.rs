//! Reshape the World Bank wide export into `data/labor_gap_long.csv`.
//!
//! Usage: `prep_labor_data [RAW_CSV] [OUT_CSV]`

use std::path::PathBuf;

use labor_gap_scenes::prep::{self, PrepOptions, DEFAULT_OUT_PATH, DEFAULT_RAW_PATH};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let raw = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_RAW_PATH));
    let out = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_PATH));

    let n = prep::run(&raw, &out, &PrepOptions::default())?;
    println!("Wrote {} ({n} rows)", out.display());
    Ok(())
}
