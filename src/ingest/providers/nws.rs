// src/ingest/providers/nws.rs
//! Government severe-weather alerts (api.weather.gov GeoJSON).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use super::feed::timeout_or_http;
use crate::error::SourceFetchError;
use crate::ingest::types::{resolve_id, FetchOutcome, Item, SourceKind, SourceProvider};
use crate::ingest::{normalize_text, CLIENT_USER_AGENT};

pub const DEFAULT_ALERT_TIMEOUT: Duration = Duration::from_secs(25);
pub const DEFAULT_ALERT_PORTAL: &str = "https://www.weather.gov/alerts";

#[derive(Debug, Default, Deserialize)]
struct AlertProperties {
    event: Option<String>,
    #[serde(rename = "areaDesc")]
    area_desc: Option<String>,
    sent: Option<String>,
    effective: Option<String>,
    onset: Option<String>,
    uri: Option<String>,
    id: Option<String>,
}

pub struct AlertProvider {
    label: String,
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl AlertProvider {
    pub fn new(label: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
            client,
            timeout: DEFAULT_ALERT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_body(&self) -> Result<Vec<u8>, SourceFetchError> {
        let resp = self
            .client
            .get(&self.url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(ACCEPT, "application/geo+json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| timeout_or_http(e, self.timeout))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceFetchError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| timeout_or_http(e, self.timeout))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SourceProvider for AlertProvider {
    async fn fetch_latest(&self) -> FetchOutcome {
        let t0 = Instant::now();
        let body = match self.fetch_body().await {
            Ok(b) => b,
            Err(e) => return FetchOutcome::failed(e),
        };
        let out = parse_alerts(&body, &self.label);
        histogram!(crate::metrics::FETCH_MS).record(t0.elapsed().as_secs_f64() * 1_000.0);
        out
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Project `features[].properties` into items. Non-object features are skipped.
pub fn parse_alerts(body: &[u8], label: &str) -> FetchOutcome {
    let doc: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => return FetchOutcome::failed(SourceFetchError::Parse(e.to_string())),
    };
    let Some(features) = doc.get("features").and_then(Value::as_array) else {
        return FetchOutcome::failed(SourceFetchError::Schema(
            "missing `features` array".into(),
        ));
    };

    let mut items = Vec::with_capacity(features.len());
    for feat in features {
        if !feat.is_object() {
            continue;
        }
        let props = match feat.get("properties") {
            Some(p) if p.is_object() => match AlertProperties::deserialize(p) {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!(error = %e, source = label, "skipping alert with odd properties");
                    continue;
                }
            },
            _ => AlertProperties::default(),
        };
        items.push(project(props, label));
    }

    FetchOutcome::ok(items)
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn project(p: AlertProperties, label: &str) -> Item {
    let event = non_blank(p.event);
    let uri = non_blank(p.uri);
    let explicit = non_blank(p.id);

    let id = resolve_id(explicit.as_deref(), None, uri.as_deref(), event.as_deref());
    let link = uri
        .or_else(|| explicit.clone())
        .unwrap_or_else(|| DEFAULT_ALERT_PORTAL.to_string());
    let published_at = non_blank(p.sent)
        .or_else(|| non_blank(p.effective))
        .or_else(|| non_blank(p.onset));

    Item {
        id,
        label: label.to_string(),
        kind: SourceKind::Alert,
        title: event.unwrap_or_else(|| SourceKind::Alert.placeholder_title().to_string()),
        link: Some(link),
        published_at,
        summary: p.area_desc.map(|a| normalize_text(&a)).unwrap_or_default(),
        score: 0,
    }
}
