use anyhow::Result;

use pl_home_advantage::config::AnalysisConfig;
use pl_home_advantage::pipeline;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = AnalysisConfig::from_args(&args);
    let outcome = pipeline::run_analysis(&cfg)?;
    let summary = &outcome.summary;
    let info = &summary.dataset_info;
    let overall = &summary.overall_results;

    println!("Home advantage analysis complete");
    println!(
        "Matches: {} ({} to {}), teams: {} ({} qualifying)",
        info.total_matches,
        info.date_range_start,
        info.date_range_end,
        info.unique_teams,
        info.teams_analyzed
    );
    if info.cleaning.rows_dropped() > 0 {
        println!(
            "Dropped rows: {} of {}",
            info.cleaning.rows_dropped(),
            info.cleaning.rows_read
        );
    }
    println!(
        "Home {:.2}% / Away {:.2}% / Draw {:.2}%  (gap {:+.2} pts)",
        overall.home_win_pct,
        overall.away_win_pct,
        overall.draw_pct,
        overall.home_advantage_pct_points
    );

    let chi = &summary.statistical_tests.chi_square;
    println!(
        "{}: chi2={:.4}, p={:.6}",
        chi.test_name, chi.statistic, chi.p_value
    );
    let paired = &summary.statistical_tests.paired_t_test;
    match (paired.t_statistic, paired.p_value, &paired.skip_reason) {
        (Some(t), Some(p), _) => println!("{}: t={t:.4}, p={p:.6}", paired.test_name),
        (_, _, Some(reason)) => println!("{}: skipped ({reason})", paired.test_name),
        _ => {}
    }

    if !summary.top_5_teams.is_empty() {
        println!("Strongest home advantage:");
        for team in &summary.top_5_teams {
            println!(" - {:<24} {:+.2}", team.team_name, team.home_advantage);
        }
        println!("Weakest home advantage:");
        for team in &summary.bottom_5_teams {
            println!(" - {:<24} {:+.2}", team.team_name, team.home_advantage);
        }
    }
    for path in &outcome.written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
