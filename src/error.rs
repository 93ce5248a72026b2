// src/error.rs
//! Typed failures for each pipeline operation. Only `ConfigError` ends a run;
//! everything else is recorded in the `RunResult` and the run carries on.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingVar(&'static str),

    #[error("config file {path} does not exist")]
    NotFound { path: PathBuf },

    #[error("reading {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-source fetch/parse failure. Never aborts other sources.
#[derive(Debug, Error)]
pub enum SourceFetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed feed: {0}")]
    Parse(String),

    #[error("unexpected document shape: {0}")]
    Schema(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Recency timestamps that cannot be used. Treated as "not recent".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("timestamp absent")]
    Absent,

    #[error("unparseable timestamp: {0:?}")]
    Unparseable(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("seen file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("seen file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("encoding seen records: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Built with `without_url()`: the request URL carries the bot token.
    #[error("telegram request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("telegram non-200: {status} {body}")]
    Status { status: u16, body: String },
}
