// tests/metrics_run.rs
// Series show up in a Prometheus scrape after one run.

use std::sync::Arc;

use chrono::{Duration, Utc};
use metrics_exporter_prometheus::PrometheusBuilder;

use alert_wire::dispatch::{Dispatcher, RunMode};
use alert_wire::error::DeliveryError;
use alert_wire::ingest::types::{FetchOutcome, Item, SourceKind, SourceProvider};
use alert_wire::ingest::RegisteredSource;
use alert_wire::notify::{Notification, Notifier};
use alert_wire::relevance::{FilterRules, RelevanceFilter};
use alert_wire::scoring::{PriorityScorer, ScoringRules};

struct One;

#[async_trait::async_trait]
impl SourceProvider for One {
    async fn fetch_latest(&self) -> FetchOutcome {
        let fresh = Item {
            id: Some("m-1".into()),
            label: "M".into(),
            kind: SourceKind::Feed,
            title: "Hello".into(),
            link: Some("https://m.example/1".into()),
            published_at: Some(Utc::now().to_rfc3339()),
            summary: String::new(),
            score: 0,
        };
        let mut stale = fresh.clone();
        stale.id = Some("m-2".into());
        stale.published_at = Some("2001-01-01T00:00:00Z".into());
        FetchOutcome::ok(vec![fresh, stale])
    }
    fn name(&self) -> &str {
        "M"
    }
}

struct Accept;

#[async_trait::async_trait]
impl Notifier for Accept {
    async fn send(&self, _: &Notification) -> Result<(), DeliveryError> {
        Ok(())
    }
}

#[tokio::test]
async fn run_emits_series() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("recorder");

    let d = Dispatcher::new(
        vec![RegisteredSource::new(Box::new(One))],
        RelevanceFilter::new(&FilterRules::default(), Duration::minutes(30)),
        PriorityScorer::new(&ScoringRules::default()),
        Arc::new(Accept),
    );
    let res = d.run(RunMode::Normal, Utc::now()).await;
    assert_eq!(res.total_dispatched, 1);

    let out = handle.render();
    assert!(out.contains("alerts_items_fetched_total"));
    assert!(out.contains("alerts_items_filtered_total{reason=\"stale\"}"));
    assert!(out.contains("alerts_dispatched_total"));
    assert!(out.contains("alerts_last_run_ts"));
}
