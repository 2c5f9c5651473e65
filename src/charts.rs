use std::collections::HashSet;

use crate::report::SummaryReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Outcomes,
    Teams,
}

impl ChartKind {
    pub fn next(self) -> Self {
        match self {
            ChartKind::Outcomes => ChartKind::Teams,
            ChartKind::Teams => ChartKind::Outcomes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarTone {
    Gain,
    Loss,
    Neutral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
    pub tone: BarTone,
    pub text: String,
}

impl ChartBar {
    /// Bar length in hundredths, so two decimals survive the integer bar widget.
    pub fn magnitude(&self) -> u64 {
        (self.value.abs() * 100.0).round() as u64
    }
}

pub fn outcome_bars(summary: &SummaryReport) -> Vec<ChartBar> {
    let r = &summary.overall_results;
    [
        ("Home Wins", r.home_win_pct, BarTone::Gain),
        ("Away Wins", r.away_win_pct, BarTone::Loss),
        ("Draws", r.draw_pct, BarTone::Neutral),
    ]
    .into_iter()
    .map(|(label, value, tone)| ChartBar {
        label: label.to_string(),
        value,
        tone,
        text: format!("{value:.2}%"),
    })
    .collect()
}

/// Top and bottom teams merged, largest advantage first. A team listed in
/// both groups appears once.
pub fn team_bars(summary: &SummaryReport) -> Vec<ChartBar> {
    let mut seen = HashSet::new();
    let mut teams: Vec<_> = summary
        .top_5_teams
        .iter()
        .chain(&summary.bottom_5_teams)
        .filter(|t| seen.insert(t.team_name.as_str()))
        .collect();
    teams.sort_by(|a, b| b.home_advantage.total_cmp(&a.home_advantage));
    teams
        .into_iter()
        .map(|t| ChartBar {
            label: t.team_name.clone(),
            value: t.home_advantage,
            tone: if t.home_advantage < 0.0 {
                BarTone::Loss
            } else {
                BarTone::Gain
            },
            text: format!("{:+.2}%", t.home_advantage),
        })
        .collect()
}

pub fn chart_title(kind: ChartKind, summary: &SummaryReport) -> String {
    let info = &summary.dataset_info;
    match kind {
        ChartKind::Outcomes => format!(
            "Match outcomes {} to {} (N={})",
            info.date_range_start, info.date_range_end, info.total_matches
        ),
        ChartKind::Teams => match summary.team_level_analysis.mean_home_advantage {
            Some(mean) => format!("Home advantage by team (league average {mean:+.2}%)"),
            None => "Home advantage by team".to_string(),
        },
    }
}

/// One-line verdict for the footer.
pub fn headline(summary: &SummaryReport) -> String {
    let chi = &summary.statistical_tests.chi_square;
    let gap = summary.overall_results.home_advantage_pct_points;
    let verdict = if chi.significant {
        "significant"
    } else {
        "not significant"
    };
    format!(
        "home advantage {gap:+.2} pts, chi-square p={:.6} ({verdict})",
        chi.p_value
    )
}
