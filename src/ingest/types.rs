// src/ingest/types.rs
use serde::{Deserialize, Serialize};

use crate::error::SourceFetchError;

/// Which adapter a catalog entry uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// RSS 2.0, RSS 1.0 (RDF) or Atom
    Feed,
    /// GeoJSON alert endpoint (`features[].properties`)
    Alert,
}

impl SourceKind {
    /// Title used when the source gives none.
    pub fn placeholder_title(self) -> &'static str {
        match self {
            SourceKind::Feed => "New item",
            SourceKind::Alert => "NWS Alert",
        }
    }
}

/// One normalized unit of content from any source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Option<String>,
    pub label: String,
    pub kind: SourceKind,
    pub title: String,
    pub link: Option<String>,
    pub published_at: Option<String>, // raw, format unconstrained
    pub summary: String,              // matching only
    pub score: i32,
}

impl Item {
    /// `title + " " + summary`, lower-cased. What every keyword stage matches against.
    pub fn haystack(&self) -> String {
        format!("{} {}", self.title, self.summary).to_lowercase()
    }
}

/// Best-effort stable identifier: explicit id → guid → link → title.
/// Empty candidates are skipped; `None` means the item is not dedup-stable.
pub fn resolve_id(
    explicit: Option<&str>,
    guid: Option<&str>,
    link: Option<&str>,
    title: Option<&str>,
) -> Option<String> {
    [explicit, guid, link, title]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// What a single source produced in one run. Items parsed before a fault are kept.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub items: Vec<Item>,
    pub error: Option<SourceFetchError>,
}

impl FetchOutcome {
    pub fn ok(items: Vec<Item>) -> Self {
        Self { items, error: None }
    }

    pub fn failed(error: SourceFetchError) -> Self {
        Self {
            items: Vec::new(),
            error: Some(error),
        }
    }

    pub fn partial(items: Vec<Item>, error: Option<SourceFetchError>) -> Self {
        Self { items, error }
    }
}

/// A fetch + normalize adapter for one catalog entry. Never fails outward:
/// problems travel inside `FetchOutcome::error`.
#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> FetchOutcome;
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_resolution_order() {
        assert_eq!(
            resolve_id(Some("urn:1"), Some("g"), Some("l"), Some("t")).as_deref(),
            Some("urn:1")
        );
        assert_eq!(
            resolve_id(None, Some("g"), Some("l"), Some("t")).as_deref(),
            Some("g")
        );
        assert_eq!(
            resolve_id(Some(""), Some("  "), Some("l"), Some("t")).as_deref(),
            Some("l")
        );
        assert_eq!(resolve_id(None, None, None, Some("t")).as_deref(), Some("t"));
        assert_eq!(resolve_id(None, None, None, None), None);
        assert_eq!(resolve_id(Some(""), None, Some(""), Some("")), None);
    }

    #[test]
    fn haystack_lowercases_title_and_summary() {
        let it = Item {
            id: None,
            label: "x".into(),
            kind: SourceKind::Feed,
            title: "Big NEWS".into(),
            link: None,
            published_at: None,
            summary: "More Text".into(),
            score: 0,
        };
        assert_eq!(it.haystack(), "big news more text");
    }
}
