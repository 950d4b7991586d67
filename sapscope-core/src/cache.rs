//! Durable per-file result cache
//!
//! The cache is what makes the pipeline idempotent and incremental: every
//! classified file (wins *and* non-screenshots) is written through, so a
//! later run never pays for the oracle call again.
//!
//! The persisted form is a single JSON document holding the whole
//! `file_key -> ScreenshotResult` map, read once at startup and rewritten
//! wholesale after every insertion. Entries cached under the legacy
//! protocol simply lack a `turn_count` field and deserialize as such; they
//! are never reinterpreted under the current protocol.

use crate::types::ScreenshotResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// In-memory view of the persisted `file_key -> result` map.
pub struct ResultCache {
    path: PathBuf,
    entries: HashMap<String, ScreenshotResult>,
}

impl ResultCache {
    /// Load the cache from disk.
    ///
    /// Missing or corrupt data yields an empty cache, never an error: the
    /// worst outcome of a lost cache is reclassification.
    pub fn load(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, ScreenshotResult>>(
                &content,
            ) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Corrupt result cache, starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read result cache, starting empty"
                );
                HashMap::new()
            }
        };

        tracing::info!(path = %path.display(), entries = entries.len(), "Result cache loaded");

        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    /// Look up a cached result. No I/O beyond the initial load.
    pub fn get(&self, file_key: &str) -> Option<&ScreenshotResult> {
        self.entries.get(file_key)
    }

    /// Insert a result and write the whole map back to disk.
    ///
    /// A persistence failure is logged and swallowed: the in-memory map
    /// already reflects the new entry and stays internally consistent, the
    /// entry just won't survive the process.
    pub fn put(&mut self, result: ScreenshotResult) {
        self.entries.insert(result.file_key.clone(), result);
        if let Err(e) = self.persist() {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist result cache"
            );
        }
    }

    fn persist(&self) -> crate::error::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_vec(&self.entries)?;
        std::fs::write(&self.path, serialized)?;
        Ok(())
    }

    /// Number of cached entries (valid and invalid).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All cached results, for aggregation without a fresh scan.
    pub fn results(&self) -> impl Iterator<Item = &ScreenshotResult> {
        self.entries.values()
    }
}
