//! JSON file checkpoint store
//!
//! The checkpoint is a pretty-printed JSON array of city tasks. Every save
//! writes a sibling temp file, syncs it, and renames it over the target so a
//! crash mid-write leaves either the old or the new document.

use crate::cache::traits::{CacheError, CacheResult, CheckpointStore};
use crate::cache::CityTask;
use crate::retry::{is_transient_io, RetryPolicy};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Checkpoint store backed by a single JSON document
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    retry: RetryPolicy,
}

impl JsonFileStore {
    /// Creates a store for the document at `path` using the storage retry policy
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retry: RetryPolicy::storage(),
        }
    }

    /// Overrides the retry policy used for reads and writes
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the document path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn write_atomically(&self, bytes: &[u8]) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl CheckpointStore for JsonFileStore {
    fn load(&self) -> CacheResult<Vec<CityTask>> {
        let content = self
            .retry
            .run_blocking(is_transient_io, || std::fs::read_to_string(&self.path))
            .map_err(|e| self.io_error(e))?;

        serde_json::from_str(&content).map_err(|source| CacheError::Malformed {
            path: self.path.display().to_string(),
            source,
        })
    }

    fn save(&mut self, tasks: &[CityTask]) -> CacheResult<()> {
        let bytes = serde_json::to_vec_pretty(tasks)?;
        self.retry
            .run_blocking(is_transient_io, || self.write_atomically(&bytes))
            .map_err(|e| self.io_error(e))
    }
}
