use std::fs;
use std::path::PathBuf;

use pl_home_advantage::bookmakers::{
    BookmakerTables, MERGED_FILE, clean_bookmakers, write_tables,
};
use pl_home_advantage::sparql::{Binding, parse_bindings};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_tables() -> BookmakerTables {
    let books: Vec<Binding> =
        parse_bindings(&read_fixture("wikidata_bookmakers.json")).expect("bookmakers parse");
    let gdp: Vec<Binding> = parse_bindings(&read_fixture("wikidata_gdp.json")).expect("gdp parses");
    BookmakerTables::from_bindings(&books, &gdp)
}

#[test]
fn bookmakers_without_country_code_are_dropped() {
    let tables = fixture_tables();
    assert_eq!(tables.raw_bookmakers.len(), 5);
    assert_eq!(tables.raw_bookmakers[3].iso2, "");

    let labels: Vec<&str> = tables.bookmakers.iter().map(|b| b.company_label.as_str()).collect();
    assert_eq!(labels, vec!["Bet365", "William Hill", "Kindred Group", "Tipico"]);
    assert_eq!(tables.bookmakers[2].iso2, "SE");
    assert_eq!(tables.bookmaker_countries(), 3);

    let bet365 = &tables.bookmakers[0];
    assert_eq!(bet365.inception_year, Some(2000));
    assert_eq!(bet365.employees, Some(5300.0));
    assert_eq!(bet365.revenue, Some(3_400_000_000.0));
    assert_eq!(tables.bookmakers[1].employees, None);
    assert_eq!(tables.bookmakers[2].employees, None);
    assert_eq!(tables.bookmakers[2].inception_year, None);
}

#[test]
fn gdp_keeps_latest_year_per_country() {
    let tables = fixture_tables();
    assert_eq!(tables.raw_gdp.len(), 6);

    let gdp: Vec<(&str, f64, i32)> = tables
        .gdp
        .iter()
        .map(|g| (g.iso2.as_str(), g.gdp_per_capita, g.gdp_year))
        .collect();
    assert_eq!(
        gdp,
        vec![("DE", 48718.0, 2022), ("GB", 48866.0, 2022), ("SE", 56424.0, 2022)]
    );
}

#[test]
fn join_keeps_every_bookmaker() {
    let tables = fixture_tables();
    assert_eq!(tables.merged.len(), 4);
    assert_eq!(tables.matched_with_gdp(), 3);

    let william_hill = &tables.merged[1];
    assert_eq!(william_hill.gdp_per_capita, Some(48866.0));
    assert_eq!(william_hill.gdp_year, Some(2022));
    assert_eq!(william_hill.inception_year, Some(1934));

    let tipico = &tables.merged[3];
    assert_eq!(tipico.iso2, "MT");
    assert_eq!(tipico.gdp_per_capita, None);
    assert_eq!(tipico.gdp_country_label, None);
}

#[test]
fn writes_raw_and_processed_tables() {
    let dir = tempfile::tempdir().expect("temp dir");
    let raw = dir.path().join("raw");
    let processed = dir.path().join("processed");
    let written = write_tables(&fixture_tables(), &raw, &processed).expect("tables write");
    assert_eq!(written.len(), 5);
    assert_eq!(written.iter().filter(|p| p.starts_with(&raw)).count(), 2);

    let merged = fs::read_to_string(processed.join(MERGED_FILE)).expect("merged written");
    let mut lines = merged.lines();
    assert_eq!(
        lines.next(),
        Some(
            "company,company_label,country_label,iso2,inception_year,employees,revenue,\
gdp_country_label,gdp_per_capita,gdp_year"
        )
    );
    let tipico = lines.find(|l| l.contains("Tipico")).expect("tipico row");
    assert!(tipico.ends_with(",MT,2004,,,,,"));
}

#[test]
fn empty_tables_write_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let tables = BookmakerTables::from_bindings(&[], &[]);
    assert!(clean_bookmakers(&tables.raw_bookmakers).is_empty());
    let written =
        write_tables(&tables, &dir.path().join("raw"), &dir.path().join("processed")).expect("ok");
    assert!(written.is_empty());
}
