// src/ingest/mod.rs
pub mod providers;
pub mod timestamp;
pub mod types;

use std::time::Duration;

use futures::stream::{self, StreamExt};
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::config::catalog::{Catalog, SourceEntry};
use crate::error::SourceFetchError;
use crate::ingest::providers::{AlertProvider, FeedProvider};
use crate::ingest::types::{FetchOutcome, SourceKind, SourceProvider};

/// Identifies us to feed hosts and the alert API (which rejects anonymous clients).
pub const CLIENT_USER_AGENT: &str = "alert-wire/0.1 (+https://github.com/alert-wire/alert-wire)";

/// Upper bound for one source, on top of the per-request HTTP timeouts.
pub const DEFAULT_SOURCE_DEADLINE: Duration = Duration::from_secs(45);

/// A provider plus the catalog settings the orchestrator needs alongside it.
pub struct RegisteredSource {
    pub provider: Box<dyn SourceProvider>,
    /// Minimum score for every item of this source (applied after scoring).
    pub score_floor: i32,
}

impl RegisteredSource {
    pub fn new(provider: Box<dyn SourceProvider>) -> Self {
        Self {
            provider,
            score_floor: 0,
        }
    }

    pub fn with_score_floor(mut self, floor: i32) -> Self {
        self.score_floor = floor;
        self
    }
}

/// Normalize text: decode entities, strip tags, straighten quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// First `max` chars of `s` (char-boundary safe).
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Shared HTTP client for all sources.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(CLIENT_USER_AGENT)
        .timeout(providers::feed::DEFAULT_FEED_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Build one provider per catalog entry, keeping catalog order.
pub fn build_sources(catalog: &Catalog, client: &reqwest::Client) -> Vec<RegisteredSource> {
    catalog
        .sources
        .iter()
        .map(|entry| build_source(entry, client))
        .collect()
}

fn build_source(entry: &SourceEntry, client: &reqwest::Client) -> RegisteredSource {
    let provider: Box<dyn SourceProvider> = match entry.kind {
        SourceKind::Feed => Box::new(FeedProvider::new(&entry.label, &entry.url, client.clone())),
        SourceKind::Alert => Box::new(AlertProvider::new(&entry.label, &entry.url, client.clone())),
    };
    RegisteredSource::new(provider).with_score_floor(entry.effective_score_floor())
}

/// Fetch every source with at most `concurrency` in flight. Outcomes come back in
/// source order no matter which fetch finishes first.
pub async fn fetch_all(
    sources: &[RegisteredSource],
    concurrency: usize,
    deadline: Duration,
) -> Vec<FetchOutcome> {
    crate::metrics::ensure_metrics_described();

    // Must be collected before awaiting, or the run future is not `Send`.
    let pending: Vec<_> = sources
        .iter()
        .map(|s| fetch_one(s.provider.as_ref(), deadline))
        .collect();

    stream::iter(pending)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

async fn fetch_one(provider: &dyn SourceProvider, deadline: Duration) -> FetchOutcome {
    tracing::info!(source = provider.name(), "checking source");

    let out = match tokio::time::timeout(deadline, provider.fetch_latest()).await {
        Ok(out) => out,
        Err(_) => FetchOutcome::failed(SourceFetchError::Timeout(deadline)),
    };

    counter!(crate::metrics::ITEMS_FETCHED).increment(out.items.len() as u64);
    if let Some(e) = &out.error {
        tracing::warn!(
            source = provider.name(),
            error = %e,
            kept = out.items.len(),
            "source error"
        );
        counter!(crate::metrics::SOURCE_ERRORS).increment(1);
    } else {
        tracing::info!(source = provider.name(), fetched = out.items.len(), "fetched");
    }
    out
}
