use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::outcome::{self, Outcome};

pub const REQUIRED_COLUMNS: [&str; 5] = ["date", "home_team", "away_team", "home_goals", "away_goals"];

/// One row as it came out of the source file. Blank cells are `None`.
/// `bad_encoding` names the first required column whose bytes were not UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMatchRow {
    pub date: Option<String>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_goals: Option<String>,
    pub away_goals: Option<String>,
    pub bad_encoding: Option<&'static str>,
}

impl RawMatchRow {
    pub fn new(date: &str, home_team: &str, away_team: &str, home_goals: &str, away_goals: &str) -> Self {
        Self {
            date: non_blank(date),
            home_team: non_blank(home_team),
            away_team: non_blank(away_team),
            home_goals: non_blank(home_goals),
            away_goals: non_blank(away_goals),
            bad_encoding: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub date: NaiveDate,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
}

impl Match {
    pub fn outcome(&self) -> Outcome {
        outcome::classify_outcome(self.home_goals, self.away_goals)
    }

    pub fn goal_difference(&self) -> i64 {
        outcome::goal_difference(self.home_goals, self.away_goals)
    }

    /// Converts back to a raw row; used when a cleaned table is fed through again.
    pub fn to_raw(&self) -> RawMatchRow {
        RawMatchRow {
            date: Some(self.date.format("%Y-%m-%d").to_string()),
            home_team: Some(self.home_team.clone()),
            away_team: Some(self.away_team.clone()),
            home_goals: Some(self.home_goals.to_string()),
            away_goals: Some(self.away_goals.to_string()),
            bad_encoding: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    InvalidEncoding(&'static str),
    MissingField(&'static str),
    InvalidDate(String),
    Duplicate { first_row: usize },
    InvalidGoals { field: &'static str, value: String },
}

impl DropReason {
    pub fn describe(&self) -> String {
        match self {
            DropReason::InvalidEncoding(field) => format!("{field} is not valid UTF-8"),
            DropReason::MissingField(field) => format!("missing {field}"),
            DropReason::InvalidDate(raw) => format!("unparseable date {raw:?}"),
            DropReason::Duplicate { first_row } => format!("duplicate of row {first_row}"),
            DropReason::InvalidGoals { field, value } => format!("{field} is not a goal count: {value:?}"),
        }
    }
}

/// Per-input-row result of cleaning; `verdicts[i]` belongs to input row `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowVerdict {
    Kept,
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_read: usize,
    pub rows_kept: usize,
    #[serde(default)]
    pub invalid_encoding: usize,
    pub missing_fields: usize,
    pub invalid_dates: usize,
    pub duplicates: usize,
    pub invalid_goals: usize,
}

impl CleaningReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.rows_kept
    }
}

#[derive(Debug, Clone)]
pub struct CleanedMatches {
    pub matches: Vec<Match>,
    pub verdicts: Vec<RowVerdict>,
}

impl CleanedMatches {
    pub fn report(&self) -> CleaningReport {
        let mut report = CleaningReport {
            rows_read: self.verdicts.len(),
            rows_kept: self.matches.len(),
            ..CleaningReport::default()
        };
        for verdict in &self.verdicts {
            match verdict {
                RowVerdict::Kept => {}
                RowVerdict::Dropped(DropReason::InvalidEncoding(_)) => report.invalid_encoding += 1,
                RowVerdict::Dropped(DropReason::MissingField(_)) => report.missing_fields += 1,
                RowVerdict::Dropped(DropReason::InvalidDate(_)) => report.invalid_dates += 1,
                RowVerdict::Dropped(DropReason::Duplicate { .. }) => report.duplicates += 1,
                RowVerdict::Dropped(DropReason::InvalidGoals { .. }) => report.invalid_goals += 1,
            }
        }
        report
    }

    pub fn dropped(&self) -> impl Iterator<Item = (usize, &DropReason)> {
        self.verdicts.iter().enumerate().filter_map(|(idx, v)| match v {
            RowVerdict::Dropped(reason) => Some((idx, reason)),
            RowVerdict::Kept => None,
        })
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.matches.first()?;
        let last = self.matches.last()?;
        Some((first.date, last.date))
    }
}

struct Candidate<'a> {
    row: usize,
    date: NaiveDate,
    home_team: &'a str,
    away_team: &'a str,
    home_goals: &'a str,
    away_goals: &'a str,
}

/// Validates raw rows: date, required fields, duplicates on
/// `(date, home_team, away_team)`, goal coercion, then a stable date sort.
pub fn clean_matches(rows: &[RawMatchRow]) -> CleanedMatches {
    let mut verdicts = vec![RowVerdict::Kept; rows.len()];
    let mut candidates = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        if let Some(field) = row.bad_encoding {
            verdicts[idx] = RowVerdict::Dropped(DropReason::InvalidEncoding(field));
            continue;
        }
        let Some(raw_date) = row.date.as_deref() else {
            verdicts[idx] = RowVerdict::Dropped(DropReason::MissingField("date"));
            continue;
        };
        let Some(date) = parse_match_date(raw_date) else {
            verdicts[idx] = RowVerdict::Dropped(DropReason::InvalidDate(raw_date.to_string()));
            continue;
        };
        match required_fields(row) {
            Ok((home_team, away_team, home_goals, away_goals)) => candidates.push(Candidate {
                row: idx,
                date,
                home_team,
                away_team,
                home_goals,
                away_goals,
            }),
            Err(field) => verdicts[idx] = RowVerdict::Dropped(DropReason::MissingField(field)),
        }
    }

    let mut first_seen: HashMap<(NaiveDate, &str, &str), usize> = HashMap::new();
    let mut unique = Vec::with_capacity(candidates.len());
    for c in candidates {
        match first_seen.entry((c.date, c.home_team, c.away_team)) {
            Entry::Occupied(first) => {
                verdicts[c.row] = RowVerdict::Dropped(DropReason::Duplicate {
                    first_row: *first.get(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(c.row);
                unique.push(c);
            }
        }
    }

    let mut matches = Vec::with_capacity(unique.len());
    for c in unique {
        let Some(home_goals) = parse_goals(c.home_goals) else {
            verdicts[c.row] = RowVerdict::Dropped(DropReason::InvalidGoals {
                field: "home_goals",
                value: c.home_goals.to_string(),
            });
            continue;
        };
        let Some(away_goals) = parse_goals(c.away_goals) else {
            verdicts[c.row] = RowVerdict::Dropped(DropReason::InvalidGoals {
                field: "away_goals",
                value: c.away_goals.to_string(),
            });
            continue;
        };
        matches.push(Match {
            date: c.date,
            home_team: c.home_team.to_string(),
            away_team: c.away_team.to_string(),
            home_goals,
            away_goals,
        });
    }

    // `sort_by_key` is stable, so same-day matches keep input order.
    matches.sort_by_key(|m| m.date);

    CleanedMatches { matches, verdicts }
}

fn required_fields(row: &RawMatchRow) -> std::result::Result<(&str, &str, &str, &str), &'static str> {
    let home_team = row.home_team.as_deref().ok_or("home_team")?;
    let away_team = row.away_team.as_deref().ok_or("away_team")?;
    let home_goals = row.home_goals.as_deref().ok_or("home_goals")?;
    let away_goals = row.away_goals.as_deref().ok_or("away_goals")?;
    Ok((home_team, away_team, home_goals, away_goals))
}

/// Accepts ISO dates, RFC 3339 / ISO date-times and football-data's
/// day-first `DD/MM/YYYY` and `DD/MM/YY`.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    let year_len = s.rsplit('/').next().map(str::len)?;
    match year_len {
        4 => NaiveDate::parse_from_str(s, "%d/%m/%Y").ok(),
        2 => NaiveDate::parse_from_str(s, "%d/%m/%y").ok(),
        _ => None,
    }
}

/// Non-negative integer goal counts; `"2.0"` is accepted, `"2.5"` is not.
pub fn parse_goals(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    if !f.is_finite() || f < 0.0 || f.fract() != 0.0 || f > f64::from(u32::MAX) {
        return None;
    }
    Some(f as u32)
}

pub fn read_raw_matches(path: &Path) -> Result<Vec<RawMatchRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("open match table {}", path.display()))?;
    read_raw_matches_from(file).with_context(|| format!("read match table {}", path.display()))
}

pub fn read_raw_matches_from<R: Read>(reader: R) -> Result<Vec<RawMatchRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().context("read csv header")?.clone();

    let mut idx = [0usize; 5];
    for (slot, column) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
            .ok_or_else(|| anyhow!("match table has no {column} column"))?;
    }

    // Cells that are not UTF-8 mark the row; cleaning drops it.
    let mut out = Vec::new();
    for (line, record) in rdr.byte_records().enumerate() {
        let record = record.with_context(|| format!("decode csv record {}", line + 1))?;
        let mut cells: [Option<String>; 5] = Default::default();
        let mut bad_encoding = None;
        for ((slot, &col), column) in cells.iter_mut().zip(&idx).zip(REQUIRED_COLUMNS) {
            match std::str::from_utf8(record.get(col).unwrap_or_default()) {
                Ok(text) => *slot = non_blank(text),
                Err(_) => {
                    bad_encoding.get_or_insert(column);
                }
            }
        }
        let [date, home_team, away_team, home_goals, away_goals] = cells;
        out.push(RawMatchRow {
            date,
            home_team,
            away_team,
            home_goals,
            away_goals,
            bad_encoding,
        });
    }
    Ok(out)
}

/// Row count of the optional team reference table. Ragged rows and
/// non-UTF-8 bytes still count; only I/O failures are errors.
pub fn count_reference_teams(path: &Path) -> Result<usize> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open team table {}", path.display()))?;
    let mut n = 0usize;
    for record in rdr.byte_records() {
        record.with_context(|| format!("read team table {}", path.display()))?;
        n += 1;
    }
    Ok(n)
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
