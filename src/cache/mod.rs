//! Checkpointed work queue module
//!
//! This module owns the list of cities to harvest and their progress flags:
//! - `CityTask` and its derived `TaskStatus`
//! - The `CheckpointStore` trait and the atomic JSON file store
//! - `WorkCache`, which leases tasks to a run and checkpoints each transition

mod json_store;
mod task;
mod traits;
mod work_cache;

pub use json_store::JsonFileStore;
pub use task::{CityTask, TaskStatus};
pub use traits::{CacheError, CacheResult, CheckpointStore};
pub use work_cache::{CacheSummary, TaskLease, WorkCache};
