pub mod bookmakers;
pub mod charts;
pub mod collect;
pub mod config;
pub mod error;
pub mod football_data;
pub mod http_cache;
pub mod http_client;
pub mod league;
pub mod match_table;
pub mod outcome;
pub mod pipeline;
pub mod report;
pub mod sparql;
pub mod stats;
pub mod team_stats;
