use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::league::{self, LeagueSummary};
use crate::match_table::{self, CleanedMatches, RawMatchRow};
use crate::report::{self, SummaryReport};
use crate::stats::{self, ChiSquareResult, Descriptive, PairedTTestResult};
use crate::team_stats::{self, MIN_MATCHES_PER_VENUE, TeamRecord};

/// Everything computed from one match table. Skippable analyses keep their
/// error so the report can say why they were skipped.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub cleaned: CleanedMatches,
    pub reference_teams: Option<usize>,
    pub league: LeagueSummary,
    pub chi_square: ChiSquareResult,
    pub teams: Vec<TeamRecord>,
    pub paired_t_test: Result<PairedTTestResult, AnalysisError>,
    pub home_advantage_stats: Result<Descriptive, AnalysisError>,
}

impl Analysis {
    /// Qualifying teams, highest home advantage first.
    pub fn ranked_teams(&self) -> Vec<&TeamRecord> {
        team_stats::rank_by_home_advantage(team_stats::qualifying_teams(
            &self.teams,
            MIN_MATCHES_PER_VENUE,
        ))
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub analysis: Analysis,
    pub summary: SummaryReport,
    pub written: Vec<PathBuf>,
}

/// Runs the in-memory part of the pipeline. Only an empty dataset is fatal.
pub fn analyze(rows: &[RawMatchRow], reference_teams: Option<usize>) -> Result<Analysis, AnalysisError> {
    let cleaned = match_table::clean_matches(rows);
    let cleaning = cleaned.report();
    info!(
        read = cleaning.rows_read,
        kept = cleaning.rows_kept,
        bad_encoding = cleaning.invalid_encoding,
        missing = cleaning.missing_fields,
        bad_dates = cleaning.invalid_dates,
        duplicates = cleaning.duplicates,
        bad_goals = cleaning.invalid_goals,
        "cleaned match table"
    );
    if cleaned.matches.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let league = league::summarize_league(&cleaned.matches)?;
    info!(
        total = league.total_matches,
        home_wins = league.home_wins,
        away_wins = league.away_wins,
        draws = league.draws,
        "league outcomes"
    );
    let chi_square = stats::chi_square_uniform(&league.observed())?;

    let teams = team_stats::aggregate_teams(&cleaned.matches);
    let qualifying = team_stats::rank_by_home_advantage(team_stats::qualifying_teams(
        &teams,
        MIN_MATCHES_PER_VENUE,
    ));
    info!(
        teams = teams.len(),
        qualifying = qualifying.len(),
        min_per_venue = MIN_MATCHES_PER_VENUE,
        "aggregated teams"
    );

    let home: Vec<f64> = qualifying.iter().map(|t| t.home_win_pct()).collect();
    let away: Vec<f64> = qualifying.iter().map(|t| t.away_win_pct()).collect();
    let advantages: Vec<f64> = qualifying.iter().map(|t| t.home_advantage()).collect();
    let paired_t_test = stats::paired_t_test(&home, &away);
    let home_advantage_stats = stats::describe(&advantages);
    if let Err(err) = &paired_t_test {
        warn!(%err, "paired t-test skipped");
    }
    if let Err(err) = &home_advantage_stats {
        warn!(%err, "team-level summary skipped");
    }

    Ok(Analysis {
        cleaned,
        reference_teams,
        league,
        chi_square,
        teams,
        paired_t_test,
        home_advantage_stats,
    })
}

/// Loads the configured inputs, analyzes them and writes the artifacts.
/// Nothing is written when the dataset turns out empty.
pub fn run_analysis(cfg: &AnalysisConfig) -> Result<AnalysisOutcome> {
    let rows = match_table::read_raw_matches(&cfg.matches_path)?;
    info!(rows = rows.len(), path = %cfg.matches_path.display(), "loaded match table");

    let reference_teams = if cfg.teams_path.exists() {
        match match_table::count_reference_teams(&cfg.teams_path) {
            Ok(n) => {
                info!(teams = n, path = %cfg.teams_path.display(), "loaded team reference table");
                Some(n)
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "team reference table unreadable");
                None
            }
        }
    } else {
        warn!(path = %cfg.teams_path.display(), "team reference table not found");
        None
    };

    let analysis = analyze(&rows, reference_teams)
        .with_context(|| format!("analyze {}", cfg.matches_path.display()))?;
    let summary = report::build_summary(&analysis);

    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("create output dir {}", cfg.output_dir.display()))?;

    let mut written = Vec::new();
    let table_path = cfg.team_table_path();
    report::write_team_table(&table_path, &analysis.teams)?;
    info!(teams = analysis.teams.len(), path = %table_path.display(), "wrote team table");
    written.push(table_path);

    let summary_path = cfg.summary_path();
    report::write_summary(&summary_path, &summary)?;
    info!(path = %summary_path.display(), "wrote summary");
    written.push(summary_path);

    if cfg.write_workbook {
        let workbook_path = cfg.workbook_path();
        report::write_workbook(&workbook_path, &analysis.teams, &summary)?;
        info!(path = %workbook_path.display(), "wrote workbook");
        written.push(workbook_path);
    }

    Ok(AnalysisOutcome {
        analysis,
        summary,
        written,
    })
}
