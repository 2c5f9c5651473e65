use serde::{Deserialize, Serialize};

use crate::match_table::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    HomeWin,
    AwayWin,
    Draw,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::HomeWin => "home_win",
            Outcome::AwayWin => "away_win",
            Outcome::Draw => "draw",
        }
    }
}

pub fn classify_outcome(home_goals: u32, away_goals: u32) -> Outcome {
    if home_goals > away_goals {
        Outcome::HomeWin
    } else if home_goals < away_goals {
        Outcome::AwayWin
    } else {
        Outcome::Draw
    }
}

pub fn goal_difference(home_goals: u32, away_goals: u32) -> i64 {
    i64::from(home_goals) - i64::from(away_goals)
}

/// A validated match together with its derived result.
#[derive(Debug, Clone, Copy)]
pub struct MatchOutcome<'a> {
    pub matched: &'a Match,
    pub outcome: Outcome,
    pub goal_difference: i64,
}

pub fn derive_outcomes(matches: &[Match]) -> Vec<MatchOutcome<'_>> {
    matches
        .iter()
        .map(|m| MatchOutcome {
            matched: m,
            outcome: m.outcome(),
            goal_difference: m.goal_difference(),
        })
        .collect()
}
