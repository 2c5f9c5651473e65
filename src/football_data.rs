use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::collect::CollectedMatch;
use crate::http_cache::fetch_bytes_cached;
use crate::match_table::{parse_goals, parse_match_date};

const BASE_URL: &str = "https://www.football-data.co.uk/mmz4281";
const URI_PREFIX: &str = "http://football-data.co.uk/match";

/// Premier League seasons pulled when the SPARQL sources come up short,
/// most recent first.
pub const SEASONS: [&str; 4] = ["2324", "2223", "2122", "2021"];

pub fn season_url(season: &str) -> String {
    format!("{BASE_URL}/{season}/E0.csv")
}

/// football-data.co.uk serves Latin-1; every byte maps to the code point of
/// the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub fn synthetic_match_uri(home_team: &str, away_team: &str, date: NaiveDate) -> String {
    format!(
        "{URI_PREFIX}/{}_vs_{}_{}",
        home_team.replace(' ', "_"),
        away_team.replace(' ', "_"),
        date.format("%Y%m%d")
    )
}

/// Parses one season file. Only `Date`, `HomeTeam`, `AwayTeam`, `FTHG` and
/// `FTAG` are read; rows whose date or score does not parse are skipped.
pub fn parse_season_csv(text: &str) -> Result<Vec<CollectedMatch>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = rdr.headers().context("read season header")?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("season file has no {name} column"))
    };
    let date_idx = column("Date")?;
    let home_idx = column("HomeTeam")?;
    let away_idx = column("AwayTeam")?;
    let hg_idx = column("FTHG")?;
    let ag_idx = column("FTAG")?;

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for record in rdr.records() {
        let record = record.context("decode season record")?;
        let field = |i: usize| record.get(i).unwrap_or("").trim();
        let home_team = field(home_idx);
        let away_team = field(away_idx);
        if home_team.is_empty() || away_team.is_empty() {
            skipped += 1;
            continue;
        }
        let (Some(date), Some(home_goals), Some(away_goals)) = (
            parse_match_date(field(date_idx)),
            parse_goals(field(hg_idx)),
            parse_goals(field(ag_idx)),
        ) else {
            skipped += 1;
            continue;
        };
        out.push(CollectedMatch {
            match_uri: synthetic_match_uri(home_team, away_team, date),
            date,
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            home_goals,
            away_goals,
        });
    }
    if skipped > 0 {
        warn!(skipped, "season file rows without a usable date or score");
    }
    Ok(out)
}

fn fetch_season(client: &Client, url: &str, use_cache: bool) -> Result<Vec<CollectedMatch>> {
    let bytes = if use_cache {
        fetch_bytes_cached(client, url)?
    } else {
        let resp = client
            .get(url)
            .send()
            .with_context(|| format!("request {url} failed"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("http {status} for {url}"));
        }
        resp.bytes().context("failed reading body")?.to_vec()
    };
    parse_season_csv(&decode_latin1(&bytes)).with_context(|| format!("parse {url}"))
}

/// Downloads every season in [`SEASONS`]. A failed season is logged and
/// skipped; the result is empty only when all of them fail.
pub fn fetch_fallback_matches(client: &Client, use_cache: bool) -> Vec<CollectedMatch> {
    let mut all = Vec::new();
    for season in SEASONS {
        let url = season_url(season);
        info!(%url, "downloading season");
        match fetch_season(client, &url, use_cache) {
            Ok(matches) => {
                info!(season, matches = matches.len(), "season loaded");
                all.extend(matches);
            }
            Err(err) => warn!(season, error = %format!("{err:#}"), "season download failed"),
        }
    }
    if all.is_empty() {
        warn!("fallback source returned no matches");
    } else {
        info!(matches = all.len(), "fallback source loaded");
    }
    all
}
