use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const MATCHES_FILE: &str = "match_results.csv";
pub const TEAMS_FILE: &str = "premier_league_teams.csv";
pub const TEAM_STATS_FILE: &str = "team_stats.csv";
pub const TEAM_TABLE_FILE: &str = "team_performance_analysis.csv";
pub const SUMMARY_FILE: &str = "summary_statistics.json";
pub const WORKBOOK_FILE: &str = "home_advantage.xlsx";

const DATA_DIR_ENV: &str = "HOME_ADV_DATA_DIR";
const XLSX_ENV: &str = "HOME_ADV_XLSX";
const HTTP_TIMEOUT_ENV: &str = "HOME_ADV_HTTP_TIMEOUT_SECS";

/// Where the analysis reads its inputs and writes its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub matches_path: PathBuf,
    pub teams_path: PathBuf,
    pub output_dir: PathBuf,
    pub write_workbook: bool,
}

impl AnalysisConfig {
    /// `<data>/raw` for inputs, `<data>/processed` for outputs.
    pub fn from_data_dir(data_dir: &Path) -> Self {
        let raw = data_dir.join("raw");
        Self {
            matches_path: raw.join(MATCHES_FILE),
            teams_path: raw.join(TEAMS_FILE),
            output_dir: data_dir.join("processed"),
            write_workbook: false,
        }
    }

    /// Flags win over environment, environment over defaults.
    pub fn from_args(args: &[String]) -> Self {
        let mut cfg = Self::from_data_dir(&data_dir_from(args));
        if let Some(path) = parse_path_arg(args, "--matches") {
            cfg.matches_path = path;
        }
        if let Some(path) = parse_path_arg(args, "--teams") {
            cfg.teams_path = path;
        }
        if let Some(path) = parse_path_arg(args, "--out-dir") {
            cfg.output_dir = path;
        }
        cfg.write_workbook = has_flag(args, "--xlsx") || env_flag(XLSX_ENV);
        cfg
    }

    pub fn team_table_path(&self) -> PathBuf {
        self.output_dir.join(TEAM_TABLE_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(SUMMARY_FILE)
    }

    pub fn workbook_path(&self) -> PathBuf {
        self.output_dir.join(WORKBOOK_FILE)
    }
}

/// Settings for the data acquisition step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub http_timeout: Duration,
    pub attempts: u32,
    pub retry_pause: Duration,
    pub min_sparql_matches: usize,
    pub use_cache: bool,
}

impl CollectConfig {
    pub fn from_data_dir(data_dir: &Path) -> Self {
        Self {
            raw_dir: data_dir.join("raw"),
            processed_dir: data_dir.join("processed"),
            http_timeout: Duration::from_secs(30),
            attempts: 3,
            retry_pause: Duration::from_secs(2),
            min_sparql_matches: 50,
            use_cache: true,
        }
    }

    pub fn from_args(args: &[String]) -> Self {
        let mut cfg = Self::from_data_dir(&data_dir_from(args));
        if let Some(path) = parse_path_arg(args, "--raw-dir") {
            cfg.raw_dir = path;
        }
        if let Some(path) = parse_path_arg(args, "--out-dir") {
            cfg.processed_dir = path;
        }
        if let Some(secs) = std::env::var(HTTP_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            cfg.http_timeout = Duration::from_secs(secs.max(1));
        }
        cfg.use_cache = !has_flag(args, "--no-cache");
        cfg
    }

    pub fn matches_path(&self) -> PathBuf {
        self.raw_dir.join(MATCHES_FILE)
    }

    pub fn teams_path(&self) -> PathBuf {
        self.raw_dir.join(TEAMS_FILE)
    }

    pub fn team_stats_path(&self) -> PathBuf {
        self.raw_dir.join(TEAM_STATS_FILE)
    }
}

fn data_dir_from(args: &[String]) -> PathBuf {
    parse_path_arg(args, "--data-dir")
        .or_else(|| {
            std::env::var(DATA_DIR_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Accepts both `--flag=value` and `--flag value`.
pub fn parse_path_arg(args: &[String], flag: &str) -> Option<PathBuf> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix(&prefix) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() && !next.starts_with("--") {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
