//! Durable suppression list for tracks that repeatedly fail to match.
//!
//! Each key maps to a failure counter. Once a counter reaches the configured
//! retry limit the key is skipped on every subsequent pass, so no more search
//! quota is burned on tracks the target catalog simply does not have. The
//! backing file is a flat JSON object of `key -> count`, kept hand-editable:
//! deleting an entry (or the whole file) is the supported manual reset.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// File-backed map from match key to failure count.
///
/// Counters only ever grow. Every increment is written through to disk
/// immediately, so a crash loses at most the in-flight item. Constructed
/// without a path it becomes a plain in-memory map, which is what tests use.
pub struct SuppressionStore {
    max_retries: u32,
    path: Option<PathBuf>,
    counters: HashMap<String, u32>,
}

impl SuppressionStore {
    /// Load the store from `path`, treating a missing file as empty.
    ///
    /// A malformed file is logged and loaded as empty but left untouched on
    /// disk, giving the operator a chance to recover it before the next
    /// write-through replaces it.
    pub fn load(path: impl AsRef<Path>, max_retries: u32) -> Self {
        let path = path.as_ref().to_path_buf();
        let counters = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, u32>>(&contents) {
                Ok(counters) => {
                    info!(
                        "Loaded {} suppression entries from {:?}",
                        counters.len(),
                        path
                    );
                    counters
                }
                Err(err) => {
                    error!(
                        "Suppression file {:?} is malformed ({}), starting empty; \
                         recover or delete the file to silence this",
                        path, err
                    );
                    HashMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                error!(
                    "Failed to read suppression file {:?} ({}), starting empty",
                    path, err
                );
                HashMap::new()
            }
        };

        Self {
            max_retries,
            path: Some(path),
            counters,
        }
    }

    /// Purely in-memory store, nothing is persisted.
    pub fn in_memory(max_retries: u32) -> Self {
        Self {
            max_retries,
            path: None,
            counters: HashMap::new(),
        }
    }

    /// Whether `key` has failed often enough to be skipped outright.
    pub fn should_skip(&self, key: &str) -> bool {
        self.failure_count(key) >= self.max_retries
    }

    /// Current failure count for `key` (0 when never seen).
    pub fn failure_count(&self, key: &str) -> u32 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    /// Record one more failure for `key` and persist the store.
    ///
    /// The increment always takes effect in memory; only the write-through
    /// can fail.
    pub fn register_failure(&mut self, key: &str) -> Result<()> {
        let count = self.counters.entry(key.to_string()).or_insert(0);
        *count += 1;
        if *count >= self.max_retries {
            info!(
                "Suppressing '{}' after {} failed attempts",
                key, self.max_retries
            );
        }
        self.save()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Write the current counters to disk, atomically.
    ///
    /// Writes to a temp file in the same directory and renames it over the
    /// target, so a crash mid-write leaves either the old or the new
    /// document, never a truncated one.
    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir),
            None => tempfile::NamedTempFile::new(),
        }
        .context("Failed to create temp file for suppression store")?;

        serde_json::to_writer_pretty(&mut tmp, &self.counters)
            .context("Failed to serialize suppression store")?;

        tmp.persist(path)
            .with_context(|| format!("Failed to persist suppression store to {:?}", path))?;
        Ok(())
    }
}

/// Log-and-carry-on wrapper for failure registration.
///
/// Persistence problems must never abort a pass; the counter still advanced
/// in memory.
pub fn register_failure_best_effort(store: &mut SuppressionStore, key: &str) {
    if let Err(err) = store.register_failure(key) {
        warn!("Failed to persist suppression entry for '{}': {:#}", key, err);
    }
}
