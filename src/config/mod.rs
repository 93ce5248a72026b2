// src/config/mod.rs
//! Run configuration: credentials and knobs from the environment, plus the
//! rules file and the source catalog (both TOML, both with built-in defaults).

pub mod catalog;
pub mod rules;

use std::fs;
use std::path::{Path, PathBuf};

pub use crate::error::ConfigError;
pub use catalog::Catalog;
pub use rules::Rules;

pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_WINDOW_MINUTES: &str = "WINDOW_MINUTES";
pub const ENV_SEEN_FILE: &str = "ALERT_SEEN_FILE";
pub const ENV_FETCH_CONCURRENCY: &str = "FETCH_CONCURRENCY";

pub const DEFAULT_WINDOW_MINUTES: i64 = 30;
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;
pub const SEEN_FILE_NAME: &str = ".alert_bot_seen.json";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub window: chrono::Duration,
    pub seen_path: PathBuf,
    pub fetch_concurrency: usize,
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env` but with an injectable lookup (tests, embedding).
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };
        let bot_token = required(ENV_TELEGRAM_TOKEN)?;
        let chat_id = required(ENV_TELEGRAM_CHAT_ID)?;

        let window = parse_window(get(ENV_WINDOW_MINUTES));

        let seen_path = get(ENV_SEEN_FILE)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_seen_path);

        let fetch_concurrency = get(ENV_FETCH_CONCURRENCY)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_FETCH_CONCURRENCY);

        Ok(Self {
            bot_token,
            chat_id,
            window,
            seen_path,
            fetch_concurrency,
        })
    }
}

/// Non-numeric, negative or out-of-range values fall back to the default, with a warning.
pub fn parse_window(raw: Option<String>) -> chrono::Duration {
    let default = chrono::Duration::minutes(DEFAULT_WINDOW_MINUTES);
    match raw.as_deref().map(str::trim) {
        None | Some("") => default,
        Some(v) => match v.parse::<i64>().ok().filter(|n| *n >= 0) {
            Some(n) => chrono::Duration::try_minutes(n).unwrap_or_else(|| {
                tracing::warn!(value = v, "{ENV_WINDOW_MINUTES} out of range, using default");
                default
            }),
            None => {
                tracing::warn!(value = v, "invalid {ENV_WINDOW_MINUTES}, using default");
                default
            }
        },
    }
}

/// `~/.alert_bot_seen.json`, or the working directory when there is no home.
pub fn default_seen_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(SEEN_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(SEEN_FILE_NAME))
}

/// Resolve a config file: explicit path → env var → default relative path.
/// Explicit and env paths must exist; a missing default path yields `None`
/// so the caller can use its built-in content.
pub(crate) fn load_layered(
    explicit: Option<&Path>,
    env_name: &str,
    default_path: &str,
) -> Result<Option<String>, ConfigError> {
    let chosen = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(env_name).ok().map(PathBuf::from));

    if let Some(path) = chosen {
        if !path.exists() {
            return Err(ConfigError::NotFound { path });
        }
        return read(&path).map(Some);
    }

    let path = PathBuf::from(default_path);
    if path.exists() {
        return read(&path).map(Some);
    }
    Ok(None)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_credentials_are_reported() {
        let err = RunConfig::from_lookup(lookup(&[(ENV_TELEGRAM_TOKEN, "t")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ENV_TELEGRAM_CHAT_ID)));

        let err = RunConfig::from_lookup(lookup(&[
            (ENV_TELEGRAM_TOKEN, "  "),
            (ENV_TELEGRAM_CHAT_ID, "-100"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ENV_TELEGRAM_TOKEN)));
    }

    #[test]
    fn window_and_overrides() {
        let cfg = RunConfig::from_lookup(lookup(&[
            (ENV_TELEGRAM_TOKEN, "t"),
            (ENV_TELEGRAM_CHAT_ID, "-100"),
            (ENV_WINDOW_MINUTES, "15"),
            (ENV_SEEN_FILE, "/tmp/seen.json"),
            (ENV_FETCH_CONCURRENCY, "3"),
        ]))
        .unwrap();
        assert_eq!(cfg.window, chrono::Duration::minutes(15));
        assert_eq!(cfg.seen_path, PathBuf::from("/tmp/seen.json"));
        assert_eq!(cfg.fetch_concurrency, 3);
    }

    #[test]
    fn window_falls_back_on_garbage() {
        let mins = |raw: Option<&str>| parse_window(raw.map(String::from)).num_minutes();
        assert_eq!(mins(None), 30);
        assert_eq!(mins(Some("abc")), 30);
        assert_eq!(mins(Some("-5")), 30);
        assert_eq!(mins(Some(" 45 ")), 45);
        // parses as i64 but does not fit a chrono duration
        assert_eq!(mins(Some("9223372036854775807")), 30);

        let cfg = RunConfig::from_lookup(lookup(&[
            (ENV_TELEGRAM_TOKEN, "t"),
            (ENV_TELEGRAM_CHAT_ID, "-100"),
            (ENV_WINDOW_MINUTES, "9223372036854775807"),
        ]))
        .unwrap();
        assert_eq!(cfg.window, chrono::Duration::minutes(DEFAULT_WINDOW_MINUTES));
    }
}
