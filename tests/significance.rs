use pl_home_advantage::error::AnalysisError;
use pl_home_advantage::match_table::RawMatchRow;
use pl_home_advantage::pipeline::analyze;
use pl_home_advantage::stats::{chi_square_uniform, describe, paired_t_test};

fn close(actual: f64, expected: f64, tol: f64) -> bool {
    (actual - expected).abs() <= tol
}

#[test]
fn chi_square_rejects_uniform_outcomes() {
    let result = chi_square_uniform(&[550, 420, 300]).expect("valid counts");
    assert!(close(result.statistic, 73.8583, 1e-4), "statistic {}", result.statistic);
    assert_eq!(result.degrees_of_freedom, 2);
    assert!(result.p_value < 0.05);
    assert!(result.p_value > 0.0);
    assert!(result.significant());
}

#[test]
fn chi_square_on_balanced_counts_is_not_significant() {
    let result = chi_square_uniform(&[100, 100, 100]).expect("valid counts");
    assert_eq!(result.statistic, 0.0);
    assert!(close(result.p_value, 1.0, 1e-12));
    assert!(!result.significant());
}

#[test]
fn chi_square_matches_closed_form_for_two_dof() {
    // With two degrees of freedom the upper tail is exp(-x / 2).
    let result = chi_square_uniform(&[1, 0, 2]).expect("valid counts");
    assert!(close(result.statistic, 2.0, 1e-12));
    assert!(close(result.p_value, (-1.0f64).exp(), 1e-9));
}

#[test]
fn paired_test_reference_values() {
    let home = [60.0, 55.0, 50.0, 45.0, 70.0];
    let away = [40.0, 42.0, 35.0, 41.0, 50.0];
    let result = paired_t_test(&home, &away).expect("valid samples");
    assert_eq!(result.degrees_of_freedom, 4);
    assert!(close(result.mean_difference, 14.4, 1e-9));
    assert!(close(result.t_statistic, 4.893319, 1e-5), "t {}", result.t_statistic);
    assert!(close(result.p_value, 0.008083, 1e-5), "p {}", result.p_value);
    assert!(result.significant());
}

#[test]
fn paired_test_needs_two_pairs() {
    assert_eq!(
        paired_t_test(&[55.0], &[40.0]).unwrap_err(),
        AnalysisError::InsufficientQualifyingTeams { found: 1, required: 2 }
    );
    assert_eq!(
        paired_t_test(&[1.0, 2.0], &[1.0]).unwrap_err(),
        AnalysisError::MismatchedSamples { left: 2, right: 1 }
    );
}

#[test]
fn constant_differences_are_degenerate() {
    let err = paired_t_test(&[60.0, 50.0, 40.0], &[50.0, 40.0, 30.0]).unwrap_err();
    assert!(matches!(err, AnalysisError::DegenerateSample(_)));
}

#[test]
fn describe_uses_sample_deviation() {
    let d = describe(&[10.0, 20.0, 30.0, 40.0]).expect("enough values");
    assert!(close(d.mean, 25.0, 1e-12));
    assert!(close(d.median, 25.0, 1e-12));
    assert!(close(d.std, 12.909944, 1e-6));
    assert_eq!((d.min, d.max), (10.0, 40.0));
    assert!(describe(&[1.0]).is_err());
}

#[test]
fn few_qualifying_teams_skip_only_team_tests() {
    let rows = vec![
        RawMatchRow::new("2021-01-01", "A", "B", "2", "1"),
        RawMatchRow::new("2021-01-02", "B", "A", "0", "0"),
        RawMatchRow::new("2021-01-03", "A", "B", "1", "1"),
    ];
    let analysis = analyze(&rows, None).expect("league analysis still runs");
    assert_eq!(analysis.league.total_matches, 3);
    assert!(analysis.chi_square.p_value > 0.0);
    assert_eq!(
        analysis.paired_t_test,
        Err(AnalysisError::InsufficientQualifyingTeams { found: 0, required: 2 })
    );
    assert!(analysis.home_advantage_stats.is_err());
    assert_eq!(analysis.teams.len(), 2);
}

#[test]
fn empty_input_is_fatal() {
    let rows = vec![RawMatchRow::new("", "A", "B", "1", "0")];
    assert_eq!(analyze(&rows, None).unwrap_err(), AnalysisError::EmptyDataset);
}
