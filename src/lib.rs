// src/lib.rs
// Library surface shared by the binary and the integration tests.

pub mod cli;
pub mod config;
pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod relevance;
pub mod scoring;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

pub use crate::dispatch::{Dispatcher, RunMode, RunResult};

use crate::config::{Catalog, RunConfig, Rules};
use crate::dedup::SeenStore;
use crate::notify::TelegramNotifier;
use crate::relevance::RelevanceFilter;
use crate::scoring::PriorityScorer;

/// Resolve configuration from the environment and CLI, then perform one run.
/// Only configuration problems come back as `Err`; everything else is in the `RunResult`.
pub async fn run(cli: &cli::Cli) -> anyhow::Result<RunResult> {
    let mut cfg = RunConfig::from_env().context("run configuration")?;
    cli.apply(&mut cfg);
    let rules = Rules::load(cli.rules.as_deref()).context("loading rules")?;
    let catalog = Catalog::load(cli.sources.as_deref()).context("loading source catalog")?;

    let mode = cli.mode();
    info!(
        window_minutes = cfg.window.num_minutes(),
        ?mode,
        sources = catalog.sources.len(),
        time = %chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        "alert-wire starting"
    );

    let client = ingest::http_client();
    let notifier = TelegramNotifier::new(client.clone(), &cfg.bot_token, &cfg.chat_id);
    let dispatcher = Dispatcher::new(
        ingest::build_sources(&catalog, &client),
        RelevanceFilter::new(&rules.filter, cfg.window),
        PriorityScorer::new(&rules.scoring),
        Arc::new(notifier),
    )
    .with_store(SeenStore::new(&cfg.seen_path))
    .with_format(rules.format.clone())
    .with_concurrency(cfg.fetch_concurrency);

    Ok(dispatcher.run(mode, chrono::Utc::now()).await)
}
