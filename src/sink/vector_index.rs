//! Vector index entries and the HTTP index client

use crate::retry::RetryPolicy;
use crate::scraper::AttractionRecord;
use crate::sink::traits::{SinkError, SinkResult, VectorIndex};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// One vector with its record metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    /// The record's fields plus `id`
    pub metadata: Value,
    pub values: Vec<f32>,
}

impl VectorEntry {
    /// Wraps a record and its embedding under a fresh random id
    pub fn new(record: &AttractionRecord, values: Vec<f32>) -> SinkResult<Self> {
        let id = Uuid::new_v4().simple().to_string();
        let mut metadata = serde_json::to_value(record)?;
        if let Value::Object(fields) = &mut metadata {
            fields.insert("id".to_string(), Value::String(id.clone()));
        }
        Ok(Self {
            id,
            metadata,
            values,
        })
    }
}

/// Pairs records with their embeddings positionally
pub fn build_entries(
    records: &[AttractionRecord],
    embeddings: Vec<Vec<f32>>,
) -> SinkResult<Vec<VectorEntry>> {
    if records.len() != embeddings.len() {
        return Err(SinkError::Response(format!(
            "{} records but {} embeddings",
            records.len(),
            embeddings.len()
        )));
    }

    records
        .iter()
        .zip(embeddings)
        .map(|(record, values)| VectorEntry::new(record, values))
        .collect()
}

/// Upserts entries under `namespace`, `batch_size` per call
pub async fn upsert_batched(
    index: &dyn VectorIndex,
    namespace: &str,
    entries: &[VectorEntry],
    batch_size: usize,
) -> SinkResult<()> {
    for batch in entries.chunks(batch_size.max(1)) {
        index.upsert(namespace, batch).await?;
    }
    tracing::debug!("Upserted {} vectors into namespace {}", entries.len(), namespace);
    Ok(())
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorEntry],
    namespace: &'a str,
}

/// Vector index reached over Pinecone's data-plane HTTP API
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    http: Client,
    upsert_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl PineconeIndex {
    pub fn new(api_url: &str, api_key: impl Into<String>) -> SinkResult<Self> {
        let upsert_url = format!("{}/vectors/upsert", api_url.trim_end_matches('/'));
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|source| SinkError::Http {
                url: upsert_url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            upsert_url,
            api_key: api_key.into(),
            retry: RetryPolicy::embedding(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request(&self, body: &UpsertRequest<'_>) -> SinkResult<()> {
        let response = self
            .http
            .post(&self.upsert_url)
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|source| SinkError::Http {
                url: self.upsert_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status {
                url: self.upsert_url.clone(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, namespace: &str, entries: &[VectorEntry]) -> SinkResult<()> {
        let body = UpsertRequest {
            vectors: entries,
            namespace,
        };
        self.retry
            .run(SinkError::is_transient, || self.request(&body))
            .await
    }
}
