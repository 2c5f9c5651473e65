use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::match_table::Match;
use crate::outcome::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeagueSummary {
    pub total_matches: usize,
    pub home_wins: usize,
    pub away_wins: usize,
    pub draws: usize,
    pub home_win_pct: f64,
    pub away_win_pct: f64,
    pub draw_pct: f64,
}

impl LeagueSummary {
    pub fn home_advantage_pct_points(&self) -> f64 {
        self.home_win_pct - self.away_win_pct
    }

    /// Observed counts in the order home wins, away wins, draws.
    pub fn observed(&self) -> [u64; 3] {
        [
            self.home_wins as u64,
            self.away_wins as u64,
            self.draws as u64,
        ]
    }
}

pub fn summarize_league(matches: &[Match]) -> Result<LeagueSummary, AnalysisError> {
    if matches.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let mut home_wins = 0usize;
    let mut away_wins = 0usize;
    let mut draws = 0usize;
    for m in matches {
        match m.outcome() {
            Outcome::HomeWin => home_wins += 1,
            Outcome::AwayWin => away_wins += 1,
            Outcome::Draw => draws += 1,
        }
    }

    let n = matches.len() as f64;
    Ok(LeagueSummary {
        total_matches: matches.len(),
        home_wins,
        away_wins,
        draws,
        home_win_pct: home_wins as f64 / n * 100.0,
        away_win_pct: away_wins as f64 / n * 100.0,
        draw_pct: draws as f64 / n * 100.0,
    })
}
