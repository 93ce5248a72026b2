// src/dispatch.rs
//! One run of the bot: fetch every source, drop what was already sent or is
//! not worth sending, order by priority, deliver, remember what got through.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use tracing::{info, warn};

use crate::dedup::SeenStore;
use crate::ingest::types::Item;
use crate::ingest::{fetch_all, RegisteredSource, DEFAULT_SOURCE_DEADLINE};
use crate::metrics::{
    ensure_metrics_described, DELIVERY_ERRORS, DISPATCHED, ITEMS_FILTERED, LAST_RUN_TS,
};
use crate::notify::{format_item, format_sample, FormatRules, Notifier};
use crate::relevance::{log_skip, RelevanceFilter};
use crate::scoring::PriorityScorer;

/// Items per source previewed in sample mode.
pub const SAMPLE_ITEMS_PER_SOURCE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Normal,
    /// Preview a few raw items per source. Skips filtering and the dedup store.
    Sample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunPhase {
    Idle,
    Fetching,
    Filtering,
    Scoring,
    Sorting,
    Dispatching,
    Persisting,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::Fetching => "fetching",
            RunPhase::Filtering => "filtering",
            RunPhase::Scoring => "scoring",
            RunPhase::Sorting => "sorting",
            RunPhase::Dispatching => "dispatching",
            RunPhase::Persisting => "persisting",
            RunPhase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Per-source accounting for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub label: String,
    pub fetched: usize,
    /// In the store already, or repeated earlier in this run.
    pub already_seen: usize,
    /// Rejections keyed by `FilterReason::label()`.
    pub filtered: BTreeMap<&'static str, usize>,
    pub eligible: usize,
    pub dispatched: usize,
    pub error: Option<String>,
}

impl SourceReport {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub mode: RunMode,
    pub sources: Vec<SourceReport>,
    pub total_dispatched: usize,
    pub delivery_failures: usize,
    /// Load or save problem with the seen file; the run itself carried on.
    pub persistence_error: Option<String>,
    pub phase: RunPhase,
}

impl RunResult {
    fn new(mode: RunMode) -> Self {
        Self {
            mode,
            sources: Vec::new(),
            total_dispatched: 0,
            delivery_failures: 0,
            persistence_error: None,
            phase: RunPhase::Idle,
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        self.phase = phase;
        tracing::debug!(%phase, "run phase");
    }

    pub fn failed_sources(&self) -> usize {
        self.sources.iter().filter(|s| s.failed()).count()
    }
}

/// An item that survived filtering, tagged with the index of its source.
struct Candidate {
    source: usize,
    item: Item,
}

pub struct Dispatcher {
    sources: Vec<RegisteredSource>,
    filter: RelevanceFilter,
    scorer: PriorityScorer,
    notifier: Arc<dyn Notifier>,
    store: Option<SeenStore>,
    format: FormatRules,
    concurrency: usize,
    deadline: Duration,
}

impl Dispatcher {
    pub fn new(
        sources: Vec<RegisteredSource>,
        filter: RelevanceFilter,
        scorer: PriorityScorer,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            sources,
            filter,
            scorer,
            notifier,
            store: None,
            format: FormatRules::default(),
            concurrency: crate::config::DEFAULT_FETCH_CONCURRENCY,
            deadline: DEFAULT_SOURCE_DEADLINE,
        }
    }

    pub fn with_store(mut self, store: SeenStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_format(mut self, format: FormatRules) -> Self {
        self.format = format;
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn run(&self, mode: RunMode, now: DateTime<Utc>) -> RunResult {
        ensure_metrics_described();
        let mut result = RunResult::new(mode);

        let seen = match mode {
            RunMode::Normal => self.load_seen(now, &mut result),
            RunMode::Sample => HashSet::new(),
        };

        result.enter(RunPhase::Fetching);
        let outcomes = fetch_all(&self.sources, self.concurrency, self.deadline).await;

        let mut batches = Vec::with_capacity(outcomes.len());
        for (src, out) in self.sources.iter().zip(outcomes) {
            result.sources.push(SourceReport {
                label: src.provider.name().to_string(),
                fetched: out.items.len(),
                error: out.error.as_ref().map(ToString::to_string),
                ..SourceReport::default()
            });
            batches.push(out.items);
        }

        match mode {
            RunMode::Sample => self.run_sample(batches, &mut result).await,
            RunMode::Normal => self.run_normal(batches, &seen, now, &mut result).await,
        }

        gauge!(LAST_RUN_TS).set(now.timestamp() as f64);
        result.enter(RunPhase::Done);
        info!(
            sent = result.total_dispatched,
            delivery_failures = result.delivery_failures,
            failed_sources = result.failed_sources(),
            "run complete"
        );
        result
    }

    fn load_seen(&self, now: DateTime<Utc>, result: &mut RunResult) -> HashSet<String> {
        let Some(store) = &self.store else {
            return HashSet::new();
        };
        match store.load(now) {
            Ok(seen) => {
                info!(count = seen.len(), "loaded previously seen items");
                seen
            }
            Err(e) => {
                warn!(error = %e, "seen file unusable, starting empty");
                result.persistence_error = Some(e.to_string());
                HashSet::new()
            }
        }
    }

    async fn run_sample(&self, batches: Vec<Vec<Item>>, result: &mut RunResult) {
        result.enter(RunPhase::Dispatching);
        for (idx, items) in batches.into_iter().enumerate() {
            // first N entries; the unlinked among them are skipped, not replaced
            let linked = items
                .into_iter()
                .take(SAMPLE_ITEMS_PER_SOURCE)
                .filter(|it| it.link.as_deref().is_some_and(|l| !l.trim().is_empty()));
            for item in linked {
                if self.deliver(&format_sample(&item), result).await {
                    result.sources[idx].dispatched += 1;
                }
            }
        }
    }

    async fn run_normal(
        &self,
        batches: Vec<Vec<Item>>,
        seen: &HashSet<String>,
        now: DateTime<Utc>,
        result: &mut RunResult,
    ) {
        // dedup + stages 0–3
        result.enter(RunPhase::Filtering);
        let mut in_run: HashSet<String> = HashSet::new();
        let mut screened = Vec::new();
        for (idx, items) in batches.into_iter().enumerate() {
            let report = &mut result.sources[idx];
            for item in items {
                if let Some(id) = item.id.as_deref() {
                    if seen.contains(id) || !in_run.insert(id.to_string()) {
                        report.already_seen += 1;
                        continue;
                    }
                }
                match self.filter.screen(&item, now) {
                    Ok(()) => screened.push(Candidate { source: idx, item }),
                    Err(reason) => {
                        log_skip(&item, &reason);
                        *report.filtered.entry(reason.label()).or_default() += 1;
                        counter!(ITEMS_FILTERED, "reason" => reason.label()).increment(1);
                    }
                }
            }
        }

        // score (+ per-source floor), then the noise stage which may consult it
        result.enter(RunPhase::Scoring);
        let mut candidates = Vec::with_capacity(screened.len());
        for mut c in screened {
            let floor = self.sources[c.source].score_floor;
            c.item.score = self.scorer.score_item(&c.item).max(floor);
            match self.filter.check_noise(&c.item, c.item.score) {
                Ok(()) => {
                    result.sources[c.source].eligible += 1;
                    candidates.push(c);
                }
                Err(reason) => {
                    log_skip(&c.item, &reason);
                    *result.sources[c.source]
                        .filtered
                        .entry(reason.label())
                        .or_default() += 1;
                    counter!(ITEMS_FILTERED, "reason" => reason.label()).increment(1);
                }
            }
        }
        info!(count = candidates.len(), "recent items after filtering");

        // stable: ties keep source order, then feed order
        result.enter(RunPhase::Sorting);
        candidates.sort_by(|a, b| b.item.score.cmp(&a.item.score));

        result.enter(RunPhase::Dispatching);
        let mut delivered = Vec::new();
        for c in candidates {
            let note = format_item(&c.item, &self.format);
            if self.deliver(&note, result).await {
                result.sources[c.source].dispatched += 1;
                if let Some(id) = c.item.id {
                    delivered.push(id);
                }
            }
        }

        result.enter(RunPhase::Persisting);
        if let Some(store) = &self.store {
            match store.save(&delivered, now) {
                Ok(n) => info!(committed = delivered.len(), records = n, "seen file updated"),
                Err(e) => {
                    warn!(error = %e, "could not save seen file");
                    result.persistence_error = Some(e.to_string());
                }
            }
        }
    }

    /// Send one message; failures are logged and counted, never propagated.
    async fn deliver(&self, note: &crate::notify::Notification, result: &mut RunResult) -> bool {
        match self.notifier.send(note).await {
            Ok(()) => {
                result.total_dispatched += 1;
                counter!(DISPATCHED).increment(1);
                true
            }
            Err(e) => {
                warn!(error = %e, "delivery failed");
                result.delivery_failures += 1;
                counter!(DELIVERY_ERRORS).increment(1);
                false
            }
        }
    }
}
