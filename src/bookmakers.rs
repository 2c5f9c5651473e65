use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collect::write_csv;
use crate::config::CollectConfig;
use crate::http_client::http_client;
use crate::sparql::{self, Binding};

pub const BOOKMAKERS_RAW_FILE: &str = "wikidata_bookmakers_raw.csv";
pub const GDP_RAW_FILE: &str = "wikidata_gdp_per_capita_raw.csv";
pub const BOOKMAKERS_CLEAN_FILE: &str = "wikidata_bookmakers_clean.csv";
pub const GDP_CLEAN_FILE: &str = "wikidata_gdp_per_capita_clean.csv";
pub const MERGED_FILE: &str = "bookmakers_with_gdp.csv";

pub const BOOKMAKERS_QUERY: &str = r#"
PREFIX wd:   <http://www.wikidata.org/entity/>
PREFIX wdt:  <http://www.wikidata.org/prop/direct/>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>

SELECT ?company ?companyLabel ?country ?countryLabel ?iso2 ?inception ?employees ?revenue
WHERE {
  ?company wdt:P31 wd:Q664702 .
  OPTIONAL { ?company wdt:P17 ?country . }
  OPTIONAL { ?company wdt:P159 ?hq . ?hq wdt:P17 ?country . }
  OPTIONAL { ?country wdt:P297 ?iso2 . }
  OPTIONAL { ?company wdt:P571 ?inception . }
  OPTIONAL { ?company wdt:P1128 ?employees . }
  OPTIONAL { ?company wdt:P2139 ?revenue . }
  SERVICE wikibase:label {
    bd:serviceParam wikibase:language "[AUTO_LANGUAGE],en".
  }
}
LIMIT 500
"#;

/// Nominal GDP per capita (P2132); statements without a point in time get
/// year 0.
pub const GDP_PER_CAPITA_QUERY: &str = r#"
PREFIX wd:   <http://www.wikidata.org/entity/>
PREFIX wdt:  <http://www.wikidata.org/prop/direct/>
PREFIX p:    <http://www.wikidata.org/prop/>
PREFIX ps:   <http://www.wikidata.org/prop/statement/>
PREFIX pq:   <http://www.wikidata.org/prop/qualifier/>

SELECT ?country ?countryLabel ?iso2 ?gdpPerCapita ?gdpYear
WHERE {
  ?country wdt:P297 ?iso2 .
  ?country p:P2132 ?gdpStmt .
  ?gdpStmt ps:P2132 ?gdpPerCapita .
  OPTIONAL { ?gdpStmt pq:P585 ?gdpDate . }
  BIND( IF(BOUND(?gdpDate), YEAR(?gdpDate), 0) AS ?gdpYear )
  SERVICE wikibase:label {
    bd:serviceParam wikibase:language "[AUTO_LANGUAGE],en".
  }
}
LIMIT 5000
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBookmaker {
    pub company: String,
    pub company_label: String,
    pub country: String,
    pub country_label: String,
    pub iso2: String,
    pub inception: String,
    pub employees: String,
    pub revenue: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGdp {
    pub country: String,
    pub country_label: String,
    pub iso2: String,
    pub gdp_per_capita: String,
    pub gdp_year: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmaker {
    pub company: String,
    pub company_label: String,
    pub country: String,
    pub country_label: String,
    pub iso2: String,
    pub inception: String,
    pub inception_year: Option<i32>,
    pub employees: Option<f64>,
    pub revenue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryGdp {
    pub country: String,
    pub country_label: String,
    pub iso2: String,
    pub gdp_per_capita: f64,
    pub gdp_year: i32,
}

/// A bookmaker left-joined to its country's latest GDP per capita.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmakerWithGdp {
    pub company: String,
    pub company_label: String,
    pub country_label: String,
    pub iso2: String,
    pub inception_year: Option<i32>,
    pub employees: Option<f64>,
    pub revenue: Option<f64>,
    pub gdp_country_label: Option<String>,
    pub gdp_per_capita: Option<f64>,
    pub gdp_year: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct BookmakerTables {
    pub raw_bookmakers: Vec<RawBookmaker>,
    pub raw_gdp: Vec<RawGdp>,
    pub bookmakers: Vec<Bookmaker>,
    pub gdp: Vec<CountryGdp>,
    pub merged: Vec<BookmakerWithGdp>,
}

impl BookmakerTables {
    pub fn from_bindings(bookmaker_rows: &[Binding], gdp_rows: &[Binding]) -> Self {
        let raw_bookmakers: Vec<RawBookmaker> = bookmaker_rows.iter().map(raw_bookmaker).collect();
        let raw_gdp: Vec<RawGdp> = gdp_rows.iter().map(raw_gdp).collect();
        let bookmakers = clean_bookmakers(&raw_bookmakers);
        let gdp = latest_gdp(&raw_gdp);
        let merged = join_gdp(&bookmakers, &gdp);
        Self {
            raw_bookmakers,
            raw_gdp,
            bookmakers,
            gdp,
            merged,
        }
    }

    /// Distinct ISO2 codes among cleaned bookmakers.
    pub fn bookmaker_countries(&self) -> usize {
        self.bookmakers
            .iter()
            .map(|b| b.iso2.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn matched_with_gdp(&self) -> usize {
        self.merged.iter().filter(|m| m.gdp_per_capita.is_some()).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookmakersSummary {
    pub raw_bookmakers: usize,
    pub raw_gdp: usize,
    pub bookmakers: usize,
    pub bookmaker_countries: usize,
    pub gdp_countries: usize,
    pub matched_with_gdp: usize,
    pub written: Vec<PathBuf>,
}

fn field(row: &Binding, key: &str) -> String {
    row.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn raw_bookmaker(row: &Binding) -> RawBookmaker {
    RawBookmaker {
        company: field(row, "company"),
        company_label: field(row, "companyLabel"),
        country: field(row, "country"),
        country_label: field(row, "countryLabel"),
        iso2: field(row, "iso2"),
        inception: field(row, "inception"),
        employees: field(row, "employees"),
        revenue: field(row, "revenue"),
    }
}

fn raw_gdp(row: &Binding) -> RawGdp {
    RawGdp {
        country: field(row, "country"),
        country_label: field(row, "countryLabel"),
        iso2: field(row, "iso2"),
        gdp_per_capita: field(row, "gdpPerCapita"),
        gdp_year: field(row, "gdpYear"),
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// First run of four ASCII digits, e.g. `1934` out of `1934-01-01T00:00:00Z`.
pub fn extract_year(raw: &str) -> Option<i32> {
    raw.as_bytes()
        .windows(4)
        .find(|w| w.iter().all(u8::is_ascii_digit))
        .and_then(|w| std::str::from_utf8(w).ok())
        .and_then(|s| s.parse().ok())
}

/// Drops bookmakers without a country code (they cannot be joined),
/// upper-cases the code and coerces the numeric columns.
pub fn clean_bookmakers(rows: &[RawBookmaker]) -> Vec<Bookmaker> {
    rows.iter()
        .filter(|r| !r.iso2.is_empty())
        .map(|r| Bookmaker {
            company: r.company.clone(),
            company_label: r.company_label.clone(),
            country: r.country.clone(),
            country_label: r.country_label.clone(),
            iso2: r.iso2.to_ascii_uppercase(),
            inception: r.inception.clone(),
            inception_year: extract_year(&r.inception),
            employees: parse_number(&r.employees),
            revenue: parse_number(&r.revenue),
        })
        .collect()
}

/// One row per ISO2 code, the latest year winning; among statements of the
/// same year the later one wins. Undated or unparseable years count as 0.
/// Output is ordered by code.
pub fn latest_gdp(rows: &[RawGdp]) -> Vec<CountryGdp> {
    let mut latest: BTreeMap<String, CountryGdp> = BTreeMap::new();
    for r in rows {
        if r.iso2.is_empty() {
            continue;
        }
        let Some(gdp_per_capita) = parse_number(&r.gdp_per_capita) else {
            continue;
        };
        let gdp_year = parse_number(&r.gdp_year).map(|y| y as i32).unwrap_or(0);
        let iso2 = r.iso2.to_ascii_uppercase();
        let replace = latest
            .get(&iso2)
            .is_none_or(|existing| gdp_year >= existing.gdp_year);
        if replace {
            latest.insert(
                iso2.clone(),
                CountryGdp {
                    country: r.country.clone(),
                    country_label: r.country_label.clone(),
                    iso2,
                    gdp_per_capita,
                    gdp_year,
                },
            );
        }
    }
    latest.into_values().collect()
}

/// Left join on ISO2; every bookmaker is kept, in input order.
pub fn join_gdp(bookmakers: &[Bookmaker], gdp: &[CountryGdp]) -> Vec<BookmakerWithGdp> {
    let by_code: HashMap<&str, &CountryGdp> = gdp.iter().map(|g| (g.iso2.as_str(), g)).collect();
    bookmakers
        .iter()
        .map(|b| {
            let g = by_code.get(b.iso2.as_str());
            BookmakerWithGdp {
                company: b.company.clone(),
                company_label: b.company_label.clone(),
                country_label: b.country_label.clone(),
                iso2: b.iso2.clone(),
                inception_year: b.inception_year,
                employees: b.employees,
                revenue: b.revenue,
                gdp_country_label: g.map(|g| g.country_label.clone()),
                gdp_per_capita: g.map(|g| g.gdp_per_capita),
                gdp_year: g.map(|g| g.gdp_year),
            }
        })
        .collect()
}

fn save<T: Serialize>(path: PathBuf, rows: &[T], written: &mut Vec<PathBuf>) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    write_csv(&path, rows)?;
    info!(rows = rows.len(), path = %path.display(), "saved table");
    written.push(path);
    Ok(())
}

/// Raw tables go to `raw_dir`; cleaned and joined tables to `processed_dir`.
/// Empty tables are skipped.
pub fn write_tables(tables: &BookmakerTables, raw_dir: &Path, processed_dir: &Path) -> Result<Vec<PathBuf>> {
    for dir in [raw_dir, processed_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let mut written = Vec::new();
    save(raw_dir.join(BOOKMAKERS_RAW_FILE), &tables.raw_bookmakers, &mut written)?;
    save(raw_dir.join(GDP_RAW_FILE), &tables.raw_gdp, &mut written)?;
    save(processed_dir.join(BOOKMAKERS_CLEAN_FILE), &tables.bookmakers, &mut written)?;
    save(processed_dir.join(GDP_CLEAN_FILE), &tables.gdp, &mut written)?;
    save(processed_dir.join(MERGED_FILE), &tables.merged, &mut written)?;
    Ok(written)
}

/// Fetches bookmakers and GDP per capita from Wikidata, cleans both and
/// joins them. A failed query leaves its side empty.
pub fn run_bookmakers(cfg: &CollectConfig) -> Result<BookmakersSummary> {
    let client = http_client(cfg.http_timeout)?;
    let fetch = |query: &str, description: &str| {
        sparql::run_query_with_retry(
            client,
            sparql::WIKIDATA_ENDPOINT,
            query,
            description,
            cfg.attempts,
            cfg.retry_pause,
        )
        .unwrap_or_default()
    };
    let bookmaker_rows = fetch(BOOKMAKERS_QUERY, "fetching bookmakers");
    let gdp_rows = fetch(GDP_PER_CAPITA_QUERY, "fetching GDP per capita");
    if bookmaker_rows.is_empty() {
        warn!("no bookmaker rows; joined table will be empty");
    }

    let tables = BookmakerTables::from_bindings(&bookmaker_rows, &gdp_rows);
    info!(
        raw = tables.raw_bookmakers.len(),
        with_country = tables.bookmakers.len(),
        gdp_countries = tables.gdp.len(),
        matched = tables.matched_with_gdp(),
        "joined bookmakers with GDP per capita"
    );
    let written = write_tables(&tables, &cfg.raw_dir, &cfg.processed_dir)?;

    Ok(BookmakersSummary {
        raw_bookmakers: tables.raw_bookmakers.len(),
        raw_gdp: tables.raw_gdp.len(),
        bookmakers: tables.bookmakers.len(),
        bookmaker_countries: tables.bookmaker_countries(),
        gdp_countries: tables.gdp.len(),
        matched_with_gdp: tables.matched_with_gdp(),
        written,
    })
}
