//! File source abstraction
//!
//! The pipeline never touches the filesystem directly; it works against the
//! [`FileSource`] capability so that any backend able to list identifiers
//! and hand back bytes (a local directory, an archive, a remote listing)
//! can feed it.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A source of candidate screenshot files.
pub trait FileSource {
    /// List candidate identifiers: file names with a case-insensitive
    /// `.png` suffix. Order is preserved by the pipeline.
    fn list_candidates(&self) -> Result<Vec<String>>;

    /// Fetch the raw bytes for one identifier.
    fn fetch_bytes(&self, file_key: &str) -> Result<Vec<u8>>;
}

/// Local-directory backend.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_png(name: &str) -> bool {
    name.len() >= 4 && name[name.len() - 4..].eq_ignore_ascii_case(".png")
}

impl FileSource for DirSource {
    fn list_candidates(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| Error::Source {
            file_key: self.root.display().to_string(),
            message: format!("failed to list directory: {}", e),
        })?;

        let mut out = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::Source {
                file_key: self.root.display().to_string(),
                message: format!("failed to read directory entry: {}", e),
            })?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_png(name) {
                    out.push(name.to_string());
                }
            }
        }

        // Directory iteration order is platform-dependent; sort for a
        // stable processing order across runs.
        out.sort();
        tracing::debug!(root = %self.root.display(), count = out.len(), "Listed candidates");
        Ok(out)
    }

    fn fetch_bytes(&self, file_key: &str) -> Result<Vec<u8>> {
        std::fs::read(self.root.join(file_key)).map_err(|e| Error::Source {
            file_key: file_key.to_string(),
            message: format!("failed to read file: {}", e),
        })
    }
}
