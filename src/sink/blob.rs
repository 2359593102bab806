//! Local filesystem blob store

use crate::retry::{is_transient_io, RetryPolicy};
use crate::sink::traits::{BlobStore, SinkError, SinkResult};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Blob store writing pretty-printed JSON documents under a root directory
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    retry: RetryPolicy,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            retry: RetryPolicy::storage(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put_json(&self, path: &str, document: &Value, overwrite: bool) -> SinkResult<()> {
        let target = self.root.join(path);
        let bytes = serde_json::to_vec_pretty(document)?;
        let io_error = |source: std::io::Error| SinkError::Io {
            path: target.display().to_string(),
            source,
        };

        if let Some(parent) = target.parent() {
            self.retry
                .run(is_transient_io, || tokio::fs::create_dir_all(parent))
                .await
                .map_err(io_error)?;
        }

        let written = if overwrite {
            self.retry
                .run(is_transient_io, || tokio::fs::write(&target, &bytes))
                .await
        } else {
            self.retry
                .run(is_transient_io, || write_new(&target, &bytes))
                .await
        };

        match written {
            Ok(()) => {
                tracing::debug!("Wrote {} bytes to {}", bytes.len(), target.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(SinkError::AlreadyExists(path.to_string()))
            }
            Err(e) => Err(io_error(e)),
        }
    }
}

async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await
}
