// src/config/rules.rs
//! Deployment rules: filter keyword sets, scoring signals, presentation knobs.
//! Loaded once at start-up and handed to the filter/scorer as plain data.

use std::path::Path;

use serde::Deserialize;

use super::{load_layered, ConfigError};
use crate::notify::format::FormatRules;
use crate::relevance::FilterRules;
use crate::scoring::ScoringRules;

pub const ENV_RULES_PATH: &str = "ALERT_RULES_PATH";
pub const DEFAULT_RULES_PATH: &str = "config/rules.toml";
const BUILTIN_RULES: &str = include_str!("../../config/rules.toml");

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rules {
    #[serde(default)]
    pub filter: FilterRules,
    #[serde(default)]
    pub scoring: ScoringRules,
    #[serde(default)]
    pub format: FormatRules,
}

impl Rules {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse {
            what: "rules".into(),
            source,
        })
    }

    /// Explicit path → `$ALERT_RULES_PATH` → `config/rules.toml` → built-in rules.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let content = load_layered(explicit, ENV_RULES_PATH, DEFAULT_RULES_PATH)?;
        Self::from_toml_str(content.as_deref().unwrap_or(BUILTIN_RULES))
    }

    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_RULES)
    }
}
