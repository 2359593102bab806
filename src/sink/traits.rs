use crate::sink::VectorEntry;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by the downstream collaborators
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected response: {0}")]
    Response(String),

    #[error("Blob {0} already exists")]
    AlreadyExists(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SinkError {
    /// Transport failures, throttling and server errors are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Turns prompts into embedding vectors, one per input, in input order
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, inputs: &[String]) -> SinkResult<Vec<Vec<f32>>>;
}

/// Stores JSON documents by path
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `document` to `path`
    ///
    /// When `overwrite` is false and `path` already exists the call fails
    /// with [`SinkError::AlreadyExists`].
    async fn put_json(&self, path: &str, document: &Value, overwrite: bool) -> SinkResult<()>;
}

/// Receives embedding vectors under a namespace
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, namespace: &str, entries: &[VectorEntry]) -> SinkResult<()>;
}
