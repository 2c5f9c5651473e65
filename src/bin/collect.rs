use anyhow::Result;

use pl_home_advantage::collect;
use pl_home_advantage::config::CollectConfig;

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
    let cfg = CollectConfig::from_args(&args);
    let summary = collect::run_collect(&cfg)?;

    println!("Data collection complete");
    println!("Raw dir: {}", cfg.raw_dir.display());
    match summary.teams {
        Some(n) => println!("Teams: {n}"),
        None => println!("Teams: unavailable"),
    }
    println!(
        "Matches: {} (SPARQL {}{})",
        summary.matches,
        summary.sparql_matches,
        if summary.used_fallback { ", plus fallback CSVs" } else { "" }
    );
    if let Some(n) = summary.team_stats {
        println!("Team stat rows: {n}");
    }
    if summary.matches == 0 {
        println!("No match data collected; the analysis has nothing to read.");
    }
    Ok(())
}
