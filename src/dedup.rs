// src/dedup.rs
//! Persistent "already sent" set: a JSON object `id -> unix seconds`.
//! Entries older than the retention window are dropped on every load/save.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::error::PersistenceError;

/// How long a sent id blocks re-sending.
pub const RETENTION_DAYS: i64 = 7;

type Records = BTreeMap<String, f64>;

#[derive(Debug, Clone)]
pub struct SeenStore {
    path: PathBuf,
    retention: chrono::Duration,
}

fn unix_secs(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / 1000.0
}

impl SeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retention: chrono::Duration::days(RETENTION_DAYS),
        }
    }

    pub fn with_retention(mut self, retention: chrono::Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ids stamped strictly after `now - retention`. A missing file is an empty set.
    pub fn load(&self, now: DateTime<Utc>) -> Result<HashSet<String>, PersistenceError> {
        let cutoff = unix_secs(now - self.retention);
        let records = self.read_records()?;
        Ok(records
            .into_iter()
            .filter(|(_, ts)| *ts > cutoff)
            .map(|(id, _)| id)
            .collect())
    }

    /// Merge `new_ids` into the file, stamped with `now`. Existing stamps are kept,
    /// expired entries purged. Returns the number of records written.
    pub fn save(&self, new_ids: &[String], now: DateTime<Utc>) -> Result<usize, PersistenceError> {
        let mut records = match self.read_records() {
            Ok(r) => r,
            Err(e @ PersistenceError::Corrupt { .. }) => {
                tracing::warn!(error = %e, "replacing corrupt seen file");
                Records::new()
            }
            Err(e) => return Err(e),
        };

        let stamp = unix_secs(now);
        for id in new_ids {
            records.entry(id.clone()).or_insert(stamp);
        }

        let cutoff = unix_secs(now - self.retention);
        records.retain(|_, ts| *ts > cutoff);

        self.write_records(&records)?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "seen file saved");
        Ok(records.len())
    }

    fn read_records(&self) -> Result<Records, PersistenceError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Records::new()),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&raw).map_err(|source| PersistenceError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Temp file in the target directory, then rename over the target.
    fn write_records(&self, records: &Records) -> Result<(), PersistenceError> {
        let io_err = |source: std::io::Error| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let body = serde_json::to_vec(records)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(&body).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}
