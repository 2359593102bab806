//! Harvest pipeline - the per-run driver
//!
//! Leases cities from the [`WorkCache`] one at a time and, for each:
//! 1. Harvests its attractions with the [`Scraper`]
//! 2. Embeds the records
//! 3. Writes the vector entries to `backups/<namespace>.json`
//! 4. Upserts the entries into the vector index under the city's namespace
//! 5. Marks the city succeeded
//!
//! Any error escaping those steps is written to the failure log and the city
//! stays `processed=true, success=false`; the loop moves on to the next city.
//!
//! Checkpoint writes are synchronous and retried with thread sleeps, so every
//! cache transition runs on tokio's blocking pool.

use crate::cache::{CacheResult, CacheSummary, CheckpointStore, CityTask, JsonFileStore, WorkCache};
use crate::scraper::{HarvestReport, Scraper};
use crate::sink::{
    build_entries, embed_records, upsert_batched, BlobStore, Embedder, FailureLog, VectorIndex,
};
use crate::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Batch sizes and backup behavior for one pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub embedding_batch_size: usize,
    pub upsert_batch_size: usize,
    pub overwrite_backups: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            embedding_batch_size: 100,
            upsert_batch_size: 100,
            overwrite_backups: true,
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Every task was already processed before the run started
    pub cache_complete: bool,
    pub succeeded: Vec<HarvestReport>,
    /// Namespaces of the cities that failed
    pub failed: Vec<String>,
}

/// Blob path of a city's backup document
pub fn backup_path(namespace: &str) -> String {
    format!("backups/{}.json", namespace)
}

/// Wires the work cache, scraper and collaborators together
pub struct Pipeline<S = JsonFileStore> {
    cache: Arc<Mutex<WorkCache<S>>>,
    scraper: Scraper,
    embedder: Box<dyn Embedder>,
    blobs: Box<dyn BlobStore>,
    index: Box<dyn VectorIndex>,
    failures: FailureLog,
    settings: PipelineSettings,
}

impl<S: CheckpointStore + Send + 'static> Pipeline<S> {
    pub fn new(
        cache: WorkCache<S>,
        scraper: Scraper,
        embedder: Box<dyn Embedder>,
        blobs: Box<dyn BlobStore>,
        index: Box<dyn VectorIndex>,
        failures: FailureLog,
    ) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
            scraper,
            embedder,
            blobs,
            index,
            failures,
            settings: PipelineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Task counts from the in-memory checkpoint
    pub async fn summary(&self) -> CacheSummary {
        self.cache.lock().await.summary()
    }

    /// Processes up to the cache's per-run limit of cities
    ///
    /// Only checkpoint failures abort the run; a failing city is logged,
    /// recorded and skipped.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        if self.cache.lock().await.cache_complete() {
            tracing::info!("Every city has been processed, nothing to harvest");
            summary.cache_complete = true;
            return Ok(summary);
        }

        while let Some(lease) = self.on_cache(|cache| cache.begin_next()).await? {
            let task = lease.task().clone();
            tracing::info!("Processing {} ({})", task.city, task.country);

            match self.process_city(&task).await {
                Ok(report) => {
                    self.on_cache(move |cache| cache.finish(lease, true)).await?;
                    tracing::info!("Finished {} ({} records)", task.namespace, report.parsed);
                    summary.succeeded.push(report);
                }
                Err(e) => {
                    tracing::error!("Failed to harvest {}: {}", task.namespace, e);
                    match self.failures.record(&task, &e).await {
                        Ok(path) => tracing::info!("Failure trace written to {}", path.display()),
                        Err(log_err) => tracing::warn!(
                            "Could not write failure trace for {}: {}",
                            task.namespace,
                            log_err
                        ),
                    }
                    self.on_cache(move |cache| cache.finish(lease, false)).await?;
                    summary.failed.push(task.namespace.clone());
                }
            }
        }

        let counts = self.summary().await;
        tracing::info!(
            "Run finished: {} succeeded, {} failed, {} cities still pending",
            summary.succeeded.len(),
            summary.failed.len(),
            counts.pending
        );
        Ok(summary)
    }

    /// Runs a cache transition on the blocking pool
    async fn on_cache<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut WorkCache<S>) -> CacheResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut cache = Arc::clone(&self.cache).lock_owned().await;
        let value = tokio::task::spawn_blocking(move || op(&mut *cache)).await??;
        Ok(value)
    }

    async fn process_city(&self, task: &CityTask) -> Result<HarvestReport> {
        let harvest = self.scraper.harvest(task).await?;

        let embeddings = embed_records(
            self.embedder.as_ref(),
            &harvest.records,
            self.settings.embedding_batch_size,
        )
        .await?;
        let entries = build_entries(&harvest.records, embeddings)?;
        tracing::info!("Generated embedding data for {} records", entries.len());

        let backup = serde_json::to_value(&entries)?;
        self.blobs
            .put_json(
                &backup_path(&task.namespace),
                &backup,
                self.settings.overwrite_backups,
            )
            .await?;
        tracing::info!("Uploaded backup for {}", task.namespace);

        upsert_batched(
            self.index.as_ref(),
            &task.namespace,
            &entries,
            self.settings.upsert_batch_size,
        )
        .await?;
        tracing::info!("Uploaded {} vectors to namespace {}", entries.len(), task.namespace);

        Ok(harvest.report)
    }
}
