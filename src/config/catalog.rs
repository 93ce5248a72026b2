// src/config/catalog.rs
//! Static source catalog: an ordered list of labelled endpoints.
//!
//! TOML shape:
//! ```toml
//! [[sources]]
//! label = "🔥 Krebs on Security"
//! url = "https://krebsonsecurity.com/feed/"
//! kind = "feed"            # or "alert"
//! score_floor = 20         # optional
//! ```

use std::path::Path;

use serde::Deserialize;

use super::{load_layered, ConfigError};
use crate::ingest::types::SourceKind;

pub const ENV_SOURCES_PATH: &str = "ALERT_SOURCES_PATH";
pub const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";
const BUILTIN_SOURCES: &str = include_str!("../../config/sources.toml");

/// Alerts are always worth the severity marker unless the catalog says otherwise.
pub const DEFAULT_ALERT_SCORE_FLOOR: i32 = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    pub label: String,
    pub url: String,
    #[serde(default = "default_kind")]
    pub kind: SourceKind,
    #[serde(default)]
    pub score_floor: Option<i32>,
}

fn default_kind() -> SourceKind {
    SourceKind::Feed
}

impl SourceEntry {
    pub fn effective_score_floor(&self) -> i32 {
        self.score_floor.unwrap_or(match self.kind {
            SourceKind::Feed => 0,
            SourceKind::Alert => DEFAULT_ALERT_SCORE_FLOOR,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub sources: Vec<SourceEntry>,
}

impl Catalog {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cat: Catalog = toml::from_str(s).map_err(|source| ConfigError::Parse {
            what: "source catalog".into(),
            source,
        })?;
        cat.validate()?;
        Ok(cat)
    }

    /// Explicit path → `$ALERT_SOURCES_PATH` → `config/sources.toml` → built-in catalog.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let content = load_layered(explicit, ENV_SOURCES_PATH, DEFAULT_SOURCES_PATH)?;
        Self::from_toml_str(content.as_deref().unwrap_or(BUILTIN_SOURCES))
    }

    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_SOURCES)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid("source catalog is empty".into()));
        }
        for s in &self.sources {
            if s.label.trim().is_empty() || s.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "source entry needs a label and url: {s:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses_in_order() {
        let cat = Catalog::builtin().unwrap();
        assert!(cat.sources.len() > 10);
        assert!(cat.sources.iter().any(|s| s.kind == SourceKind::Alert));
        assert_eq!(cat.sources[0].kind, SourceKind::Feed);
    }

    #[test]
    fn kind_defaults_to_feed_and_alert_floor() {
        let cat = Catalog::from_toml_str(
            r#"
[[sources]]
label = "a"
url = "https://a.example/rss"

[[sources]]
label = "w"
url = "https://w.example/alerts"
kind = "alert"
"#,
        )
        .unwrap();
        assert_eq!(cat.sources[0].kind, SourceKind::Feed);
        assert_eq!(cat.sources[0].effective_score_floor(), 0);
        assert_eq!(cat.sources[1].effective_score_floor(), DEFAULT_ALERT_SCORE_FLOOR);
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            Catalog::from_toml_str("sources = []"),
            Err(ConfigError::Invalid(_))
        ));
    }
}
