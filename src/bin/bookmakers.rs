use anyhow::Result;

use pl_home_advantage::bookmakers;
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
    let summary = bookmakers::run_bookmakers(&cfg)?;

    println!("Bookmaker pipeline complete");
    println!(
        "Bookmakers: {} fetched, {} with a country code across {} countries",
        summary.raw_bookmakers, summary.bookmakers, summary.bookmaker_countries
    );
    println!(
        "GDP per capita: {} statements, {} countries",
        summary.raw_gdp, summary.gdp_countries
    );
    println!("Matched with GDP: {}", summary.matched_with_gdp);
    for path in &summary.written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}
