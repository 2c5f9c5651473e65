use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::match_table::Match;

/// Teams need this many home and this many away matches to be ranked/tested.
pub const MIN_MATCHES_PER_VENUE: usize = 10;

/// One team's results in a single role (home or away).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueRecord {
    pub matches: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub goals_scored: u64,
    pub goals_conceded: u64,
}

impl VenueRecord {
    fn record(&mut self, scored: u32, conceded: u32) {
        self.matches += 1;
        self.goals_scored += u64::from(scored);
        self.goals_conceded += u64::from(conceded);
        if scored > conceded {
            self.wins += 1;
        } else if scored < conceded {
            self.losses += 1;
        } else {
            self.draws += 1;
        }
    }

    pub fn goal_difference(&self) -> i64 {
        self.goals_scored as i64 - self.goals_conceded as i64
    }

    /// Win percentage; 0 when the team never played in this role.
    pub fn win_pct(&self) -> f64 {
        if self.matches == 0 {
            return 0.0;
        }
        self.wins as f64 / self.matches as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team_name: String,
    pub home: VenueRecord,
    pub away: VenueRecord,
}

impl TeamRecord {
    pub fn new(team_name: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            home: VenueRecord::default(),
            away: VenueRecord::default(),
        }
    }

    pub fn home_win_pct(&self) -> f64 {
        self.home.win_pct()
    }

    pub fn away_win_pct(&self) -> f64 {
        self.away.win_pct()
    }

    pub fn home_advantage(&self) -> f64 {
        self.home_win_pct() - self.away_win_pct()
    }

    pub fn total_matches(&self) -> usize {
        self.home.matches + self.away.matches
    }

    pub fn qualifies(&self, min_per_venue: usize) -> bool {
        self.home.matches >= min_per_venue && self.away.matches >= min_per_venue
    }
}

/// One record per team seen as home or away, in team-name order.
pub fn aggregate_teams(matches: &[Match]) -> Vec<TeamRecord> {
    let mut teams: BTreeMap<&str, TeamRecord> = BTreeMap::new();
    for m in matches {
        teams
            .entry(m.home_team.as_str())
            .or_insert_with(|| TeamRecord::new(m.home_team.as_str()))
            .home
            .record(m.home_goals, m.away_goals);
        teams
            .entry(m.away_team.as_str())
            .or_insert_with(|| TeamRecord::new(m.away_team.as_str()))
            .away
            .record(m.away_goals, m.home_goals);
    }
    teams.into_values().collect()
}

pub fn qualifying_teams(records: &[TeamRecord], min_per_venue: usize) -> Vec<&TeamRecord> {
    records.iter().filter(|t| t.qualifies(min_per_venue)).collect()
}

/// Stable sort, highest home advantage first; ties keep their input order.
pub fn rank_by_home_advantage(mut teams: Vec<&TeamRecord>) -> Vec<&TeamRecord> {
    teams.sort_by(|a, b| b.home_advantage().total_cmp(&a.home_advantage()));
    teams
}

pub fn top_n<'a, 'b>(ranked: &'b [&'a TeamRecord], n: usize) -> &'b [&'a TeamRecord] {
    &ranked[..n.min(ranked.len())]
}

/// Last `n` of the ranked list, still in descending order.
pub fn bottom_n<'a, 'b>(ranked: &'b [&'a TeamRecord], n: usize) -> &'b [&'a TeamRecord] {
    &ranked[ranked.len() - n.min(ranked.len())..]
}
