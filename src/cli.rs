//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// One week.
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Polls RSS/Atom feeds and posts an event for every new item.
#[derive(Debug, Parser)]
#[command(name = "feed-monitor", author, version, about, long_about = None)]
pub struct Cli {
    /// Register a feed URL and exit
    #[arg(short, long, value_name = "URL", conflicts_with = "list")]
    pub add: Option<String>,

    /// List registered feeds with their last seen timestamp and exit
    #[arg(short, long)]
    pub list: bool,

    /// Minutes to wait between feed checks (at most one week)
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_MINUTES))]
    pub interval: u64,

    /// Path to the JSON settings file
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Path to the SQLite database
    #[arg(short, long, default_value = "feeds.db")]
    pub database: PathBuf,

    /// Number of feeds to check concurrently
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// Seconds before a feed download or notification gives up
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Check every feed once and exit
    #[arg(long)]
    pub once: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.saturating_mul(60))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
