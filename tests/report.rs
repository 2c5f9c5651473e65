use std::fs;
use std::path::{Path, PathBuf};

use pl_home_advantage::config::AnalysisConfig;
use pl_home_advantage::match_table::RawMatchRow;
use pl_home_advantage::pipeline::{analyze, run_analysis};
use pl_home_advantage::report::{TEAM_TABLE_COLUMNS, build_summary, read_summary, summary_json};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn config(matches: PathBuf, teams: PathBuf, out: &Path) -> AnalysisConfig {
    AnalysisConfig {
        matches_path: matches,
        teams_path: teams,
        output_dir: out.to_path_buf(),
        write_workbook: false,
    }
}

#[test]
fn writes_team_table_and_summary() {
    let dir = tempfile::tempdir().expect("temp dir");
    let out = dir.path().join("processed");
    let cfg = config(
        fixture_path("matches_dirty.csv"),
        fixture_path("teams.csv"),
        &out,
    );
    let outcome = run_analysis(&cfg).expect("analysis succeeds");
    assert_eq!(outcome.written.len(), 2);

    let table = fs::read_to_string(cfg.team_table_path()).expect("team table written");
    let mut lines = table.lines();
    let header: Vec<&str> = lines.next().expect("header").split(',').collect();
    assert_eq!(header.len(), 20);
    assert_eq!(header, TEAM_TABLE_COLUMNS.to_vec());
    assert_eq!(lines.count(), 6);

    let raw = fs::read_to_string(cfg.summary_path()).expect("summary written");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    for key in [
        "dataset_info",
        "overall_results",
        "statistical_tests",
        "team_level_analysis",
        "top_5_teams",
        "bottom_5_teams",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(raw.contains("\n    \"dataset_info\""));
    assert_eq!(json["dataset_info"]["total_matches"], 3);
    assert_eq!(json["dataset_info"]["reference_teams"], 3);
    assert_eq!(json["dataset_info"]["cleaning"]["duplicates"], 1);
    assert_eq!(json["dataset_info"]["date_range_start"], "2023-08-11");
    assert_eq!(json["overall_results"]["home_win_pct"], 33.33);
    let chi = &json["statistical_tests"]["chi_square"];
    assert_eq!(chi["statistic"], 0.0);
    assert_eq!(chi["p_value"], 1.0);
    assert_eq!(chi["significant"], false);
    assert!(chi.get("available").is_none());

    let summary = read_summary(&cfg.summary_path()).expect("summary reads back");
    assert_eq!(summary, outcome.summary);
}

#[test]
fn skipped_team_tests_are_reported_not_invented() {
    let dir = tempfile::tempdir().expect("temp dir");
    let cfg = config(
        fixture_path("matches_dirty.csv"),
        dir.path().join("no_teams.csv"),
        dir.path(),
    );
    let outcome = run_analysis(&cfg).expect("analysis succeeds");
    let summary = &outcome.summary;

    assert_eq!(summary.dataset_info.reference_teams, None);
    assert_eq!(summary.statistical_tests.chi_square.degrees_of_freedom, 2);
    let paired = &summary.statistical_tests.paired_t_test;
    assert!(!paired.available);
    assert_eq!(paired.t_statistic, None);
    assert!(paired.skip_reason.as_deref().unwrap_or_default().contains("qualifying teams"));
    assert!(!summary.team_level_analysis.available);
    assert!(summary.top_5_teams.is_empty());

    let raw = fs::read_to_string(cfg.summary_path()).expect("summary written");
    let json: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert!(json["statistical_tests"]["paired_t_test"].get("p_value").is_none());
}

#[test]
fn ragged_team_reference_file_is_not_fatal() {
    let dir = tempfile::tempdir().expect("temp dir");
    let teams = dir.path().join("teams.csv");
    fs::write(
        &teams,
        "team_uri,team_name,stadium,founded\n\
dbr:Arsenal,Arsenal F.C.,dbr:Emirates_Stadium,1886\n\
dbr:Burnley,Burnley F.C.\n",
    )
    .expect("write teams");
    let cfg = config(fixture_path("matches_dirty.csv"), teams, dir.path());

    let outcome = run_analysis(&cfg).expect("analysis succeeds");
    assert_eq!(outcome.summary.dataset_info.reference_teams, Some(2));
    assert!(cfg.summary_path().exists());
}

#[test]
fn empty_dataset_writes_nothing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let matches = dir.path().join("matches.csv");
    fs::write(
        &matches,
        "date,home_team,away_team,home_goals,away_goals\nnot-a-date,A,B,1,0\n",
    )
    .expect("write input");
    let out = dir.path().join("processed");
    let cfg = config(matches, dir.path().join("teams.csv"), &out);

    let err = run_analysis(&cfg).unwrap_err();
    assert!(format!("{err:#}").contains("no valid matches"));
    assert!(!out.exists());
}

#[test]
fn workbook_is_optional() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut cfg = config(
        fixture_path("matches_dirty.csv"),
        fixture_path("teams.csv"),
        dir.path(),
    );
    cfg.write_workbook = true;
    let outcome = run_analysis(&cfg).expect("analysis succeeds");
    assert_eq!(outcome.written.len(), 3);
    assert!(cfg.workbook_path().exists());
}

/// Each listed team plays 10 home and 10 away games against one-off
/// opponents, winning the given number at home and away and drawing or
/// losing the rest. One-off opponents never qualify.
fn ranked_league(teams: &[(&str, u32, u32)]) -> Vec<RawMatchRow> {
    let mut rows = Vec::new();
    for (name, home_wins, away_wins) in teams {
        for game in 0..10u32 {
            let date = format!("2022-{:02}-{:02}", 1 + game, 1);
            let opponent = format!("{name} guest {game}");
            let (hg, ag) = if game < *home_wins { ("1", "0") } else { ("0", "0") };
            rows.push(RawMatchRow::new(&date, name, &opponent, hg, ag));

            let host = format!("{name} host {game}");
            let (hg, ag) = if game < *away_wins { ("0", "2") } else { ("1", "0") };
            rows.push(RawMatchRow::new(&date, &host, name, hg, ag));
        }
    }
    rows
}

#[test]
fn top_and_bottom_lists_cut_the_descending_ranking() {
    // Delta is listed before Charlie and ties with it at +30.
    let rows = ranked_league(&[
        ("Hotel", 2, 6),
        ("Delta", 6, 3),
        ("Alpha", 8, 2),
        ("Golf", 3, 5),
        ("Charlie", 6, 3),
        ("Echo", 5, 4),
        ("Bravo", 7, 2),
        ("Foxtrot", 4, 4),
    ]);
    let analysis = analyze(&rows, None).expect("analysis runs");
    let summary = build_summary(&analysis);
    assert_eq!(summary.dataset_info.teams_analyzed, 8);

    let listed = |teams: &[pl_home_advantage::report::TeamAdvantage]| -> Vec<(String, f64)> {
        teams
            .iter()
            .map(|t| (t.team_name.clone(), t.home_advantage))
            .collect()
    };
    let expect = |pairs: &[(&str, f64)]| -> Vec<(String, f64)> {
        pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    };
    assert_eq!(
        listed(&summary.top_5_teams),
        expect(&[
            ("Alpha", 60.0),
            ("Bravo", 50.0),
            ("Charlie", 30.0),
            ("Delta", 30.0),
            ("Echo", 10.0),
        ])
    );
    assert_eq!(
        listed(&summary.bottom_5_teams),
        expect(&[
            ("Delta", 30.0),
            ("Echo", 10.0),
            ("Foxtrot", 0.0),
            ("Golf", -20.0),
            ("Hotel", -40.0),
        ])
    );

    let json: serde_json::Value =
        serde_json::from_str(&summary_json(&summary).expect("serializes")).expect("valid json");
    let names = |key: &str| -> Vec<String> {
        json[key]
            .as_array()
            .expect("array")
            .iter()
            .map(|t| t["team_name"].as_str().expect("name").to_string())
            .collect()
    };
    assert_eq!(names("top_5_teams"), ["Alpha", "Bravo", "Charlie", "Delta", "Echo"]);
    assert_eq!(names("bottom_5_teams"), ["Delta", "Echo", "Foxtrot", "Golf", "Hotel"]);
}
