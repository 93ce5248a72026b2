// src/cli.rs
use std::path::PathBuf;

use clap::Parser;

use crate::config::RunConfig;
use crate::dispatch::RunMode;

#[derive(Debug, Parser)]
#[command(name = "alert-wire")]
#[command(version)]
#[command(about = "Poll news feeds and weather alerts, push the fresh ones to Telegram")]
pub struct Cli {
    /// Send the first items of every source unfiltered; leaves the seen file alone
    #[arg(long, visible_alias = "sample")]
    pub debug: bool,

    /// Rules file (filter keywords, scoring signals, message format)
    #[arg(long, value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Source catalog
    #[arg(long, value_name = "PATH")]
    pub sources: Option<PathBuf>,

    /// Seen-items file (overrides ALERT_SEEN_FILE)
    #[arg(long, value_name = "PATH")]
    pub seen_file: Option<PathBuf>,

    /// Recency window in minutes (overrides WINDOW_MINUTES)
    #[arg(long, value_name = "MINUTES")]
    pub window_minutes: Option<u32>,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.debug {
            RunMode::Sample
        } else {
            RunMode::Normal
        }
    }

    /// CLI flags win over the environment.
    pub fn apply(&self, cfg: &mut RunConfig) {
        if let Some(path) = &self.seen_file {
            cfg.seen_path = path.clone();
        }
        if let Some(m) = self.window_minutes {
            cfg.window = chrono::Duration::minutes(i64::from(m));
        }
    }
}
