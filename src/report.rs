use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::{Deserialize, Serialize};

use crate::match_table::CleaningReport;
use crate::pipeline::Analysis;
use crate::stats::ALPHA;
use crate::team_stats::{self, MIN_MATCHES_PER_VENUE, TeamRecord};

pub const RANKED_TEAMS_SHOWN: usize = 5;

pub const TEAM_TABLE_COLUMNS: [&str; 20] = [
    "team_name",
    "home_matches",
    "home_wins",
    "home_draws",
    "home_losses",
    "home_goals_scored",
    "home_goals_conceded",
    "home_goal_difference",
    "home_win_pct",
    "away_matches",
    "away_wins",
    "away_draws",
    "away_losses",
    "away_goals_scored",
    "away_goals_conceded",
    "away_goal_difference",
    "away_win_pct",
    "home_advantage",
    "total_matches",
    "qualifies",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub dataset_info: DatasetInfo,
    pub overall_results: OverallResults,
    pub statistical_tests: StatisticalTests,
    pub team_level_analysis: TeamLevelAnalysis,
    pub top_5_teams: Vec<TeamAdvantage>,
    pub bottom_5_teams: Vec<TeamAdvantage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub total_matches: usize,
    pub date_range_start: String,
    pub date_range_end: String,
    pub unique_teams: usize,
    pub teams_analyzed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_teams: Option<usize>,
    pub cleaning: CleaningReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallResults {
    pub home_wins: usize,
    pub away_wins: usize,
    pub draws: usize,
    pub home_win_pct: f64,
    pub away_win_pct: f64,
    pub draw_pct: f64,
    pub home_advantage_pct_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalTests {
    pub chi_square: ChiSquareSection,
    pub paired_t_test: PairedTTestSection,
}

/// Always computed: a non-empty dataset has at least one outcome count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareSection {
    pub test_name: String,
    pub statistic: f64,
    pub p_value: f64,
    pub significant: bool,
    pub degrees_of_freedom: usize,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedTTestSection {
    pub test_name: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_statistic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub significant: Option<bool>,
    pub pairs: usize,
    pub alpha: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLevelAnalysis {
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_home_advantage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_home_advantage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_home_advantage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_home_advantage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_home_advantage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAdvantage {
    pub team_name: String,
    pub home_advantage: f64,
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn pct(value: f64) -> f64 {
    round_to(value, 2)
}

pub fn build_summary(analysis: &Analysis) -> SummaryReport {
    let league = &analysis.league;
    let ranked = analysis.ranked_teams();
    let (start, end) = analysis
        .cleaned
        .date_range()
        .map(|(s, e)| (s.format("%Y-%m-%d").to_string(), e.format("%Y-%m-%d").to_string()))
        .unwrap_or_default();

    let chi = &analysis.chi_square;
    let chi_square = ChiSquareSection {
        test_name: "Chi-Square Goodness-of-Fit Test (uniform outcomes)".to_string(),
        statistic: round_to(chi.statistic, 4),
        p_value: round_to(chi.p_value, 6),
        significant: chi.significant(),
        degrees_of_freedom: chi.degrees_of_freedom,
        alpha: ALPHA,
    };

    let paired_name = "Paired T-Test (Home vs Away Win %)".to_string();
    let paired_t_test = match &analysis.paired_t_test {
        Ok(t) => PairedTTestSection {
            test_name: paired_name,
            available: true,
            t_statistic: Some(round_to(t.t_statistic, 4)),
            p_value: Some(round_to(t.p_value, 6)),
            significant: Some(t.significant()),
            pairs: ranked.len(),
            alpha: ALPHA,
            skip_reason: None,
        },
        Err(err) => PairedTTestSection {
            test_name: paired_name,
            available: false,
            t_statistic: None,
            p_value: None,
            significant: None,
            pairs: ranked.len(),
            alpha: ALPHA,
            skip_reason: Some(err.to_string()),
        },
    };

    let team_level_analysis = match &analysis.home_advantage_stats {
        Ok(d) => TeamLevelAnalysis {
            available: true,
            mean_home_advantage: Some(pct(d.mean)),
            median_home_advantage: Some(pct(d.median)),
            std_home_advantage: Some(pct(d.std)),
            min_home_advantage: Some(pct(d.min)),
            max_home_advantage: Some(pct(d.max)),
            skip_reason: None,
        },
        Err(err) => TeamLevelAnalysis {
            available: false,
            mean_home_advantage: None,
            median_home_advantage: None,
            std_home_advantage: None,
            min_home_advantage: None,
            max_home_advantage: None,
            skip_reason: Some(err.to_string()),
        },
    };

    let advantage = |t: &&TeamRecord| TeamAdvantage {
        team_name: t.team_name.clone(),
        home_advantage: pct(t.home_advantage()),
    };

    SummaryReport {
        dataset_info: DatasetInfo {
            total_matches: league.total_matches,
            date_range_start: start,
            date_range_end: end,
            unique_teams: analysis.teams.len(),
            teams_analyzed: ranked.len(),
            reference_teams: analysis.reference_teams,
            cleaning: analysis.cleaned.report(),
        },
        overall_results: OverallResults {
            home_wins: league.home_wins,
            away_wins: league.away_wins,
            draws: league.draws,
            home_win_pct: pct(league.home_win_pct),
            away_win_pct: pct(league.away_win_pct),
            draw_pct: pct(league.draw_pct),
            home_advantage_pct_points: pct(league.home_advantage_pct_points()),
        },
        statistical_tests: StatisticalTests {
            chi_square,
            paired_t_test,
        },
        team_level_analysis,
        top_5_teams: team_stats::top_n(&ranked, RANKED_TEAMS_SHOWN)
            .iter()
            .map(advantage)
            .collect(),
        bottom_5_teams: team_stats::bottom_n(&ranked, RANKED_TEAMS_SHOWN)
            .iter()
            .map(advantage)
            .collect(),
    }
}

pub fn team_row(team: &TeamRecord) -> Vec<String> {
    vec![
        team.team_name.clone(),
        team.home.matches.to_string(),
        team.home.wins.to_string(),
        team.home.draws.to_string(),
        team.home.losses.to_string(),
        team.home.goals_scored.to_string(),
        team.home.goals_conceded.to_string(),
        team.home.goal_difference().to_string(),
        format!("{:.2}", team.home_win_pct()),
        team.away.matches.to_string(),
        team.away.wins.to_string(),
        team.away.draws.to_string(),
        team.away.losses.to_string(),
        team.away.goals_scored.to_string(),
        team.away.goals_conceded.to_string(),
        team.away.goal_difference().to_string(),
        format!("{:.2}", team.away_win_pct()),
        format!("{:.2}", team.home_advantage()),
        team.total_matches().to_string(),
        team.qualifies(MIN_MATCHES_PER_VENUE).to_string(),
    ]
}

/// Full, unfiltered team table; one row per team.
pub fn write_team_table(path: &Path, teams: &[TeamRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create team table {}", path.display()))?;
    writer
        .write_record(TEAM_TABLE_COLUMNS)
        .context("write team table header")?;
    for team in teams {
        writer
            .write_record(team_row(team))
            .with_context(|| format!("write team row {}", team.team_name))?;
    }
    writer.flush().context("flush team table")?;
    Ok(())
}

pub fn summary_json(summary: &SummaryReport) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    summary.serialize(&mut ser).context("serialize summary")?;
    String::from_utf8(buf).context("summary is not utf-8")
}

pub fn write_summary(path: &Path, summary: &SummaryReport) -> Result<()> {
    let json = summary_json(summary)?;
    let mut file = fs::File::create(path)
        .with_context(|| format!("create summary {}", path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("write summary {}", path.display()))?;
    Ok(())
}

pub fn read_summary(path: &Path) -> Result<SummaryReport> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read summary {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid summary json {}", path.display()))
}

/// Same team table plus a key/value summary sheet, for spreadsheet users.
pub fn write_workbook(path: &Path, teams: &[TeamRecord], summary: &SummaryReport) -> Result<()> {
    let mut team_rows = vec![TEAM_TABLE_COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>()];
    team_rows.extend(teams.iter().map(team_row));

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Teams")?;
        write_rows(sheet, &team_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows(summary))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn summary_rows(summary: &SummaryReport) -> Vec<Vec<String>> {
    let info = &summary.dataset_info;
    let overall = &summary.overall_results;
    let chi = &summary.statistical_tests.chi_square;
    let paired = &summary.statistical_tests.paired_t_test;
    let teams = &summary.team_level_analysis;

    let mut rows = vec![
        kv("Metric", "Value"),
        kv("Total matches", info.total_matches),
        kv("Date range", format!("{} to {}", info.date_range_start, info.date_range_end)),
        kv("Unique teams", info.unique_teams),
        kv("Teams analyzed", info.teams_analyzed),
        kv("Rows dropped", info.cleaning.rows_dropped()),
        kv("Home wins", overall.home_wins),
        kv("Away wins", overall.away_wins),
        kv("Draws", overall.draws),
        kv("Home win %", overall.home_win_pct),
        kv("Away win %", overall.away_win_pct),
        kv("Draw %", overall.draw_pct),
        kv("Home advantage (pct points)", overall.home_advantage_pct_points),
        kv("Chi-square statistic", chi.statistic),
        kv("Chi-square p-value", chi.p_value),
        kv("Paired t statistic", opt_to_string(paired.t_statistic)),
        kv("Paired t p-value", opt_to_string(paired.p_value)),
        kv("Mean home advantage", opt_to_string(teams.mean_home_advantage)),
        kv("Median home advantage", opt_to_string(teams.median_home_advantage)),
    ];
    if let Some(reason) = &paired.skip_reason {
        rows.push(kv("Paired t-test skipped", reason));
    }
    for (idx, t) in summary.top_5_teams.iter().enumerate() {
        rows.push(kv(&format!("Top {}", idx + 1), format!("{} ({:+.2})", t.team_name, t.home_advantage)));
    }
    for (idx, t) in summary.bottom_5_teams.iter().enumerate() {
        rows.push(kv(&format!("Bottom {}", idx + 1), format!("{} ({:+.2})", t.team_name, t.home_advantage)));
    }
    rows
}

fn kv(key: &str, value: impl ToString) -> Vec<String> {
    vec![key.to_string(), value.to_string()]
}

fn opt_to_string<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".to_string())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_places() {
        assert_eq!(round_to(43.8157, 2), 43.82);
        assert_eq!(round_to(73.858267, 4), 73.8583);
        assert_eq!(round_to(0.0000004, 6), 0.0);
        assert_eq!(round_to(-10.526, 2), -10.53);
    }
}
