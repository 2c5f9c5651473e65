use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::CollectConfig;
use crate::football_data;
use crate::http_client::http_client;
use crate::match_table::{parse_goals, parse_match_date};
use crate::sparql::{self, Binding};

const UNKNOWN: &str = "Unknown";

/// One row of `match_results.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedMatch {
    pub match_uri: String,
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRow {
    pub team_uri: String,
    pub team_name: String,
    pub stadium: String,
    pub founded: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStatRow {
    pub team_name: String,
    pub wins: String,
    pub goals_for: String,
}

#[derive(Debug, Clone, Default)]
pub struct CollectSummary {
    pub teams: Option<usize>,
    pub sparql_matches: usize,
    pub used_fallback: bool,
    pub matches: usize,
    pub team_stats: Option<usize>,
    pub written: Vec<PathBuf>,
}

/// Team rows deduplicated on URI, names trimmed.
pub fn teams_from_bindings(rows: &[Binding]) -> Vec<TeamRow> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for row in rows {
        let Some(team_uri) = row.get("team") else {
            continue;
        };
        if !seen.insert(team_uri.clone()) {
            continue;
        }
        out.push(TeamRow {
            team_uri: team_uri.clone(),
            team_name: row.get("teamName").map(|s| s.trim().to_string()).unwrap_or_default(),
            stadium: row.get("stadium").cloned().unwrap_or_else(|| UNKNOWN.to_string()),
            founded: row.get("founded").cloned().unwrap_or_else(|| UNKNOWN.to_string()),
        });
    }
    out
}

/// Match rows from the Wikidata query. Rows missing a parseable date or
/// score are dropped here rather than written out.
pub fn matches_from_bindings(rows: &[Binding]) -> Vec<CollectedMatch> {
    rows.iter()
        .filter_map(|row| {
            let date = parse_match_date(row.get("date")?)?;
            let home_goals = parse_goals(row.get("homeGoals")?)?;
            let away_goals = parse_goals(row.get("awayGoals")?)?;
            let home_team = row.get("homeTeamLabel")?.trim().to_string();
            let away_team = row.get("awayTeamLabel")?.trim().to_string();
            let match_uri = row.get("match").cloned().unwrap_or_else(|| {
                football_data::synthetic_match_uri(&home_team, &away_team, date)
            });
            Some(CollectedMatch {
                match_uri,
                date,
                home_team,
                away_team,
                home_goals,
                away_goals,
            })
        })
        .collect()
}

pub fn stats_from_bindings(rows: &[Binding]) -> Vec<TeamStatRow> {
    rows.iter()
        .map(|row| TeamStatRow {
            team_name: row.get("teamName").cloned().unwrap_or_default(),
            wins: row.get("wins").cloned().unwrap_or_else(|| "0".to_string()),
            goals_for: row.get("goalsFor").cloned().unwrap_or_else(|| "0".to_string()),
        })
        .collect()
}

/// Appends `extra` to `primary`, dropping later rows whose
/// (date, home, away) key was already seen.
pub fn merge_matches(primary: Vec<CollectedMatch>, extra: Vec<CollectedMatch>) -> Vec<CollectedMatch> {
    let mut seen = HashSet::new();
    primary
        .into_iter()
        .chain(extra)
        .filter(|m| seen.insert((m.date, m.home_team.clone(), m.away_team.clone())))
        .collect()
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("write row to {}", path.display()))?;
    }
    wtr.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// Fetches teams, matches and team statistics into the raw data directory.
/// Each source is optional; only a failure to write is an error.
pub fn run_collect(cfg: &CollectConfig) -> Result<CollectSummary> {
    std::fs::create_dir_all(&cfg.raw_dir)
        .with_context(|| format!("create raw dir {}", cfg.raw_dir.display()))?;
    let client = http_client(cfg.http_timeout)?;
    let mut summary = CollectSummary::default();

    if let Some(rows) = sparql::run_query_with_retry(
        client,
        sparql::DBPEDIA_ENDPOINT,
        sparql::TEAMS_QUERY,
        "fetching Premier League teams",
        cfg.attempts,
        cfg.retry_pause,
    ) {
        let teams = teams_from_bindings(&rows);
        if teams.is_empty() {
            warn!("team query returned no rows");
        } else {
            let path = cfg.teams_path();
            write_csv(&path, &teams)?;
            info!(teams = teams.len(), path = %path.display(), "saved teams");
            summary.teams = Some(teams.len());
            summary.written.push(path);
        }
    }

    let sparql_matches = sparql::run_query_with_retry(
        client,
        sparql::WIKIDATA_ENDPOINT,
        sparql::MATCHES_QUERY,
        "fetching match results",
        cfg.attempts,
        cfg.retry_pause,
    )
    .map(|rows| matches_from_bindings(&rows))
    .unwrap_or_default();
    summary.sparql_matches = sparql_matches.len();

    let matches = if sparql_matches.len() < cfg.min_sparql_matches {
        if !sparql_matches.is_empty() {
            warn!(
                matches = sparql_matches.len(),
                required = cfg.min_sparql_matches,
                "too few SPARQL matches, adding fallback source"
            );
        }
        summary.used_fallback = true;
        merge_matches(
            sparql_matches,
            football_data::fetch_fallback_matches(client, cfg.use_cache),
        )
    } else {
        sparql_matches
    };

    if matches.is_empty() {
        warn!("no match data from either source");
    } else {
        let path = cfg.matches_path();
        write_csv(&path, &matches)?;
        info!(matches = matches.len(), path = %path.display(), "saved matches");
        summary.matches = matches.len();
        summary.written.push(path);
    }

    if let Some(rows) = sparql::run_query_with_retry(
        client,
        sparql::DBPEDIA_ENDPOINT,
        sparql::TEAM_STATS_QUERY,
        "fetching team statistics",
        cfg.attempts,
        cfg.retry_pause,
    ) {
        let stats = stats_from_bindings(&rows);
        if !stats.is_empty() {
            let path = cfg.team_stats_path();
            write_csv(&path, &stats)?;
            info!(rows = stats.len(), path = %path.display(), "saved team statistics");
            summary.team_stats = Some(stats.len());
            summary.written.push(path);
        }
    }

    Ok(summary)
}
