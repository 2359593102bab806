//! Checkpoint store trait and error types
//!
//! The work cache persists its full task list through this trait after every
//! state transition.

use crate::cache::CityTask;
use thiserror::Error;

/// Errors that can occur while loading or saving the checkpoint
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed checkpoint {path}: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task {0} is still leased; finish it before taking another")]
    LeaseOutstanding(usize),

    #[error("Lease for task {0} does not belong to this cache")]
    UnknownLease(usize),
}

/// Result type for checkpoint operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Backend that holds the ordered task list between runs
pub trait CheckpointStore {
    /// Loads the full task list in stored order
    fn load(&self) -> CacheResult<Vec<CityTask>>;

    /// Replaces the stored task list with `tasks`
    ///
    /// Implementations must never leave a truncated document behind.
    fn save(&mut self, tasks: &[CityTask]) -> CacheResult<()>;
}
