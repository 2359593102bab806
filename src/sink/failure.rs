//! Per-city failure artifacts

use crate::cache::CityTask;
use crate::retry::{is_transient_io, RetryPolicy};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Writes one human-readable trace per failed city to `<dir>/<namespace>.txt`
#[derive(Debug, Clone)]
pub struct FailureLog {
    dir: PathBuf,
    retry: RetryPolicy,
}

impl FailureLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            retry: RetryPolicy::storage(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the artifact for a namespace
    pub fn artifact_path(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", namespace))
    }

    /// Writes the failure trace for `task`, replacing any earlier one
    pub async fn record(&self, task: &CityTask, error: &(dyn Error + 'static)) -> std::io::Result<PathBuf> {
        let path = self.artifact_path(&task.namespace);
        let report = render_failure(task, error, Utc::now());

        self.retry
            .run(is_transient_io, || tokio::fs::create_dir_all(&self.dir))
            .await?;
        self.retry
            .run(is_transient_io, || tokio::fs::write(&path, &report))
            .await?;
        Ok(path)
    }
}

/// Renders the timestamp, the city and the error with its source chain
pub fn render_failure(task: &CityTask, error: &(dyn Error + 'static), at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "time: {}", at.to_rfc3339());
    let _ = writeln!(out, "city: {}, {} ({})", task.city, task.country, task.namespace);
    let _ = writeln!(out, "error: {}", error);

    let mut source = error.source();
    while let Some(cause) = source {
        let _ = writeln!(out, "caused by: {}", cause);
        source = cause.source();
    }
    let _ = writeln!(out, "\n{:#?}", error);
    out
}
