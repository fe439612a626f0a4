// tests/prep.rs
use labor_gap_scenes::data::tabular::parse_csv;
use labor_gap_scenes::prep::{run, PrepOptions};
use std::fs;

const RAW: &str = "\
Country Name,Country Code,Series Name,Series Code,2016 [YR2016],2023 [YR2023],2024 [YR2024],2025 [YR2025]
Qatar,QAT,Ratio of female to male labor force participation rate (%) (modeled ILO estimate),SL.TLF.CACT.FM.ZS,55.0,60.1,61.2,99
Norway,NOR,Ratio of female to male labor force participation rate (%) (modeled ILO estimate),SL.TLF.CACT.FM.ZS,90.5,..,93.0,99
,,,,,,,
Data from database: World Development Indicators,,,,,,,
";

#[test]
fn prepared_file_feeds_the_loader() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw_female_labor_data2.csv");
    let out = dir.path().join("data").join("labor_gap_long.csv");
    fs::write(&raw, RAW).unwrap();

    let n = run(&raw, &out, &PrepOptions::default()).unwrap();
    assert_eq!(n, 5);

    let text = fs::read_to_string(&out).unwrap();
    let rows = parse_csv("prep-test", &text).unwrap();
    let got: Vec<(&str, i32)> = rows.iter().map(|r| (r.country_name.as_str(), r.year)).collect();
    assert_eq!(
        got,
        vec![
            ("Qatar", 2016),
            ("Norway", 2016),
            ("Qatar", 2023),
            ("Qatar", 2024),
            ("Norway", 2024),
        ]
    );
    // 2025 is outside the default window.
    assert!(rows.iter().all(|r| r.year <= 2024));
}
