// src/relevance.rs
//! Relevance gate: eligibility → paywall → off-topic → recency → (score) → noise.
//! Stages short-circuit; the first failing stage is returned as a `FilterReason`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::TimestampError;
use crate::ingest::timestamp::{parse_optional, within_window};
use crate::ingest::truncate_chars;
use crate::ingest::types::Item;

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterRules {
    #[serde(default)]
    pub paywall_domains: Vec<String>,
    #[serde(default)]
    pub off_topic_keywords: Vec<String>,
    #[serde(default)]
    pub suppress_keywords: Vec<String>,
    #[serde(default)]
    pub override_keywords: Vec<String>,
    /// Items scoring at least this are exempt from noise suppression.
    #[serde(default)]
    pub noise_exempt_score: Option<i32>,
}

/// Why a stale item was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    TooOld,
    Unusable(TimestampError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterReason {
    MissingLink,
    MissingId,
    Paywall(String),
    OffTopic(String),
    Stale(Staleness),
    Noise(String),
}

impl FilterReason {
    /// Stable short name, used as a metrics label and in run reports.
    pub fn label(&self) -> &'static str {
        match self {
            FilterReason::MissingLink => "missing_link",
            FilterReason::MissingId => "missing_id",
            FilterReason::Paywall(_) => "paywall",
            FilterReason::OffTopic(_) => "off_topic",
            FilterReason::Stale(_) => "stale",
            FilterReason::Noise(_) => "noise",
        }
    }
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterReason::MissingLink => write!(f, "no link"),
            FilterReason::MissingId => write!(f, "no stable id"),
            FilterReason::Paywall(d) => write!(f, "paywall ({d})"),
            FilterReason::OffTopic(k) => write!(f, "off-topic ({k})"),
            FilterReason::Stale(Staleness::TooOld) => write!(f, "outside window"),
            FilterReason::Stale(Staleness::Unusable(e)) => write!(f, "{e}"),
            FilterReason::Noise(k) => write!(f, "noise ({k})"),
        }
    }
}

/* ----------------------------
Filter
---------------------------- */

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    paywall_domains: Vec<String>,
    off_topic: Vec<String>,
    suppress: Vec<String>,
    overrides: Vec<String>,
    noise_exempt_score: Option<i32>,
    window: chrono::Duration,
}

fn lowered(v: &[String]) -> Vec<String> {
    v.iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn first_match<'a>(haystack: &str, needles: &'a [String]) -> Option<&'a str> {
    needles
        .iter()
        .find(|n| haystack.contains(n.as_str()))
        .map(String::as_str)
}

/// The link's host equals a listed domain or is a subdomain of it, so `ft.com`
/// does not catch `microsoft.com`. Unparseable links fall back to a substring test.
fn paywall_match<'a>(link: &str, domains: &'a [String]) -> Option<&'a str> {
    let host = reqwest::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase));
    let Some(host) = host else {
        return first_match(&link.to_lowercase(), domains);
    };
    domains
        .iter()
        .find(|d| {
            host == d.as_str()
                || host
                    .strip_suffix(d.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        })
        .map(String::as_str)
}

impl RelevanceFilter {
    pub fn new(rules: &FilterRules, window: chrono::Duration) -> Self {
        Self {
            paywall_domains: lowered(&rules.paywall_domains)
                .into_iter()
                .map(|d| d.trim_start_matches('.').to_string())
                .collect(),
            off_topic: lowered(&rules.off_topic_keywords),
            suppress: lowered(&rules.suppress_keywords),
            overrides: lowered(&rules.override_keywords),
            noise_exempt_score: rules.noise_exempt_score,
            window,
        }
    }

    pub fn window(&self) -> chrono::Duration {
        self.window
    }

    /// Stages 0–3: eligibility, paywall, off-topic, recency.
    pub fn screen(&self, item: &Item, now: DateTime<Utc>) -> Result<(), FilterReason> {
        let link = match item.link.as_deref().map(str::trim) {
            Some(l) if !l.is_empty() => l,
            _ => return Err(FilterReason::MissingLink),
        };
        if item.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            return Err(FilterReason::MissingId);
        }

        if let Some(domain) = paywall_match(link, &self.paywall_domains) {
            return Err(FilterReason::Paywall(domain.to_string()));
        }

        let haystack = item.haystack();
        if let Some(kw) = first_match(&haystack, &self.off_topic) {
            return Err(FilterReason::OffTopic(kw.to_string()));
        }

        match parse_optional(item.published_at.as_deref()) {
            Ok(published) if within_window(published, now, self.window) => Ok(()),
            Ok(_) => Err(FilterReason::Stale(Staleness::TooOld)),
            Err(e) => Err(FilterReason::Stale(Staleness::Unusable(e))),
        }
    }

    /// Stage 4. Overrides win over suppression, and so does a high enough score.
    pub fn check_noise(&self, item: &Item, score: i32) -> Result<(), FilterReason> {
        let haystack = item.haystack();
        if first_match(&haystack, &self.overrides).is_some() {
            return Ok(());
        }
        if self.noise_exempt_score.is_some_and(|t| score >= t) {
            return Ok(());
        }
        match first_match(&haystack, &self.suppress) {
            Some(kw) => Err(FilterReason::Noise(kw.to_string())),
            None => Ok(()),
        }
    }
}

/// Content-based rejections are worth seeing at info; staleness is the common case.
pub(crate) fn log_skip(item: &Item, reason: &FilterReason) {
    let title = truncate_chars(&item.title, 50);
    match reason {
        FilterReason::Paywall(_) | FilterReason::OffTopic(_) | FilterReason::Noise(_) => {
            info!(target: "relevance", source = %item.label, reason = reason.label(), %title, "skipped ({reason})")
        }
        _ => debug!(target: "relevance", source = %item.label, reason = reason.label(), %title, "skipped ({reason})"),
    }
}

/* ----------------------------
Tests
---------------------------- */
