use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pl_home_advantage::league::summarize_league;
use pl_home_advantage::match_table::{Match, RawMatchRow, clean_matches};
use pl_home_advantage::outcome::{Outcome, derive_outcomes};
use pl_home_advantage::pipeline::analyze;
use pl_home_advantage::team_stats::{MIN_MATCHES_PER_VENUE, aggregate_teams, qualifying_teams};

const TEAMS: [&str; 6] = ["Arsenal", "Brentford", "Chelsea", "Everton", "Fulham", "Wolves"];

/// Two double round-robins, so every team has exactly 10 home and 10 away matches.
fn seeded_seasons(seed: u64) -> Vec<RawMatchRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2021, 8, 14).unwrap();
    let mut rows = Vec::new();
    let mut day = 0i64;
    for _ in 0..2 {
        for home in TEAMS {
            for away in TEAMS {
                if home == away {
                    continue;
                }
                let date = start + Duration::days(day);
                day += 1;
                let hg: u32 = rng.gen_range(0..4);
                let ag: u32 = rng.gen_range(0..3);
                rows.push(RawMatchRow::new(
                    &date.format("%Y-%m-%d").to_string(),
                    home,
                    away,
                    &hg.to_string(),
                    &ag.to_string(),
                ));
            }
        }
    }
    rows
}

fn scenario() -> Vec<Match> {
    let rows = vec![
        RawMatchRow::new("2021-01-01", "A", "B", "2", "1"),
        RawMatchRow::new("2021-01-02", "B", "A", "0", "0"),
        RawMatchRow::new("2021-01-03", "A", "B", "1", "1"),
    ];
    clean_matches(&rows).matches
}

#[test]
fn three_match_scenario_counts() {
    let matches = scenario();
    let league = summarize_league(&matches).expect("non-empty");
    assert_eq!(league.total_matches, 3);
    assert_eq!(league.home_wins, 1);
    assert_eq!(league.away_wins, 0);
    assert_eq!(league.draws, 2);
    assert!((league.home_win_pct - 100.0 / 3.0).abs() < 1e-9);
    assert!((league.draw_pct - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(league.away_win_pct, 0.0);

    let outcomes: Vec<Outcome> = derive_outcomes(&matches).iter().map(|o| o.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::HomeWin, Outcome::Draw, Outcome::Draw]);
}

#[test]
fn three_match_scenario_team_records() {
    let teams = aggregate_teams(&scenario());
    assert_eq!(teams.len(), 2);
    let a = &teams[0];
    assert_eq!(a.team_name, "A");
    assert_eq!((a.home.matches, a.home.wins, a.home.draws), (2, 1, 1));
    assert_eq!((a.home.goals_scored, a.home.goals_conceded), (3, 2));
    assert_eq!((a.away.matches, a.away.draws), (1, 1));
    let b = &teams[1];
    assert_eq!((b.away.matches, b.away.losses, b.away.draws), (2, 1, 1));
    assert_eq!(b.away.goal_difference(), -1);
}

#[test]
fn team_without_away_matches_has_zero_away_pct() {
    let rows = vec![RawMatchRow::new("2021-01-01", "Solo", "Visitor", "3", "0")];
    let teams = aggregate_teams(&clean_matches(&rows).matches);
    let solo = teams.iter().find(|t| t.team_name == "Solo").expect("team present");
    assert_eq!(solo.away.matches, 0);
    assert_eq!(solo.away_win_pct(), 0.0);
    assert!(!solo.away_win_pct().is_nan());
    assert_eq!(solo.home_advantage(), 100.0);
    assert!(qualifying_teams(&teams, MIN_MATCHES_PER_VENUE).is_empty());
}

#[test]
fn venue_counts_add_up_for_every_team() {
    for seed in [1u64, 7, 42] {
        let cleaned = clean_matches(&seeded_seasons(seed));
        let matches = &cleaned.matches;
        let league = summarize_league(matches).expect("non-empty");
        assert_eq!(league.home_wins + league.away_wins + league.draws, league.total_matches);

        let teams = aggregate_teams(matches);
        assert_eq!(teams.len(), TEAMS.len());
        let mut home_total = 0;
        let mut home_goals = 0;
        let mut away_goals_conceded = 0;
        for team in &teams {
            assert_eq!(team.home.wins + team.home.draws + team.home.losses, team.home.matches);
            assert_eq!(team.away.wins + team.away.draws + team.away.losses, team.away.matches);
            assert_eq!(team.home.matches, 10);
            assert_eq!(team.away.matches, 10);
            assert!(team.qualifies(MIN_MATCHES_PER_VENUE));
            home_total += team.home.matches;
            home_goals += team.home.goals_scored;
            away_goals_conceded += team.away.goals_conceded;
        }
        assert_eq!(home_total, league.total_matches);
        assert_eq!(home_goals, away_goals_conceded);
        let home_wins: usize = teams.iter().map(|t| t.home.wins).sum();
        assert_eq!(home_wins, league.home_wins);
    }
}

#[test]
fn repeated_runs_are_identical() {
    let rows = seeded_seasons(42);
    let first = analyze(&rows, None).expect("analysis runs");
    let second = analyze(&rows, None).expect("analysis runs");
    assert_eq!(first.teams, second.teams);

    let names = |a: &pl_home_advantage::pipeline::Analysis| -> Vec<String> {
        a.ranked_teams().iter().map(|t| t.team_name.clone()).collect()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(names(&first).len(), TEAMS.len());
}

#[test]
fn ranking_is_descending_by_home_advantage() {
    let analysis = analyze(&seeded_seasons(7), None).expect("analysis runs");
    let ranked = analysis.ranked_teams();
    for pair in ranked.windows(2) {
        assert!(pair[0].home_advantage() >= pair[1].home_advantage());
    }
}
