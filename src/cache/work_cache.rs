//! Checkpointed work queue over city tasks
//!
//! The cache hands out one task at a time as a [`TaskLease`]:
//!
//! 1. `begin_next` finds the next unprocessed task in stored order, flags it
//!    `processed = true, success = false`, persists, and returns the lease.
//! 2. The caller harvests the city.
//! 3. `finish` flags `success = true` and persists again when the harvest
//!    completed; a failed harvest keeps the first checkpoint as is.
//!
//! At most `limit` leases are handed out per run. `processed` never reverts
//! while leases are being handed out; re-queueing failed cities is a separate,
//! explicit operation ([`WorkCache::reset_failed`]).

use crate::cache::traits::{CacheError, CacheResult, CheckpointStore};
use crate::cache::{CityTask, JsonFileStore, TaskStatus};
use std::path::Path;

/// A city handed out by the cache and not yet finished
#[derive(Debug)]
pub struct TaskLease {
    index: usize,
    task: CityTask,
}

impl TaskLease {
    /// The leased task, as it was when handed out
    pub fn task(&self) -> &CityTask {
        &self.task
    }

    /// Position of the task in the checkpoint document
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Counts of tasks by derived status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheSummary {
    pub total: usize,
    pub pending: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Checkpointed queue of city tasks
pub struct WorkCache<S = JsonFileStore> {
    store: S,
    tasks: Vec<CityTask>,
    limit: usize,
    leased_this_run: usize,
    outstanding: Option<usize>,
}

impl WorkCache<JsonFileStore> {
    /// Opens the JSON checkpoint at `path` with a per-run limit
    ///
    /// # Example
    ///
    /// ```no_run
    /// use attraction_harvester::WorkCache;
    /// use std::path::Path;
    ///
    /// let mut cache = WorkCache::open(Path::new("cities.json"), 2).unwrap();
    /// while let Some(lease) = cache.begin_next().unwrap() {
    ///     println!("harvesting {}", lease.task().city);
    ///     cache.finish(lease, true).unwrap();
    /// }
    /// ```
    pub fn open(path: &Path, limit: usize) -> CacheResult<Self> {
        Self::with_store(JsonFileStore::new(path), limit)
    }
}

impl<S: CheckpointStore> WorkCache<S> {
    /// Loads the task list from `store`
    pub fn with_store(store: S, limit: usize) -> CacheResult<Self> {
        let tasks = store.load()?;
        tracing::debug!("Loaded {} city tasks from checkpoint", tasks.len());
        Ok(Self {
            store,
            tasks,
            limit,
            leased_this_run: 0,
            outstanding: None,
        })
    }

    /// Leases the next unprocessed task, if the run limit allows one
    ///
    /// The task is checkpointed as `processed = true, success = false`
    /// before this returns. If that write fails the task is left untouched
    /// and will be handed out again.
    pub fn begin_next(&mut self) -> CacheResult<Option<TaskLease>> {
        if let Some(index) = self.outstanding {
            return Err(CacheError::LeaseOutstanding(index));
        }

        if self.leased_this_run >= self.limit {
            tracing::debug!("Run limit of {} cities reached", self.limit);
            return Ok(None);
        }

        let Some(index) = self.tasks.iter().position(|t| !t.processed) else {
            return Ok(None);
        };

        let previous = (self.tasks[index].processed, self.tasks[index].success);
        self.tasks[index].processed = true;
        self.tasks[index].success = false;
        if let Err(e) = self.persist() {
            (self.tasks[index].processed, self.tasks[index].success) = previous;
            return Err(e);
        }

        self.leased_this_run += 1;
        self.outstanding = Some(index);

        Ok(Some(TaskLease {
            index,
            task: self.tasks[index].clone(),
        }))
    }

    /// Closes a lease, recording whether the harvest completed
    ///
    /// When the success checkpoint cannot be written the task stays failed in
    /// memory, matching what is on disk.
    pub fn finish(&mut self, lease: TaskLease, succeeded: bool) -> CacheResult<()> {
        if self.outstanding != Some(lease.index) {
            return Err(CacheError::UnknownLease(lease.index));
        }
        self.outstanding = None;

        if succeeded {
            self.tasks[lease.index].success = true;
            if let Err(e) = self.persist() {
                self.tasks[lease.index].success = false;
                return Err(e);
            }
        } else {
            tracing::debug!(
                "City {} left as processed without success",
                lease.task.namespace
            );
        }

        Ok(())
    }

    /// Returns true when every task has been processed, successful or not
    pub fn cache_complete(&self) -> bool {
        self.tasks.iter().all(|t| t.processed)
    }

    /// Re-queues every processed task that did not succeed
    ///
    /// This is the only path that clears `processed`; it is an operator
    /// action and is refused while a lease is outstanding.
    ///
    /// # Returns
    ///
    /// The number of tasks returned to the queue
    pub fn reset_failed(&mut self) -> CacheResult<usize> {
        if let Some(index) = self.outstanding {
            return Err(CacheError::LeaseOutstanding(index));
        }

        let mut reset = 0;
        for task in self.tasks.iter_mut() {
            if task.status() == TaskStatus::Failed {
                task.processed = false;
                reset += 1;
            }
        }

        if reset > 0 {
            self.persist()?;
        }
        Ok(reset)
    }

    /// Counts tasks by status
    pub fn summary(&self) -> CacheSummary {
        let mut summary = CacheSummary {
            total: self.tasks.len(),
            ..Default::default()
        };
        for task in &self.tasks {
            match task.status() {
                TaskStatus::Pending => summary.pending += 1,
                TaskStatus::Succeeded => summary.succeeded += 1,
                TaskStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// All tasks in stored order
    pub fn tasks(&self) -> &[CityTask] {
        &self.tasks
    }

    /// Number of leases handed out since this cache was opened
    pub fn processed_this_run(&self) -> usize {
        self.leased_this_run
    }

    /// The underlying checkpoint store
    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&mut self) -> CacheResult<()> {
        self.store.save(&self.tasks)
    }
}
