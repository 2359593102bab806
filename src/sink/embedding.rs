//! Text embeddings for harvested records
//!
//! Each record becomes one prompt: its name, type, description and tags.
//! Prompts are sent to the [`Embedder`] in fixed-size batches.

use crate::retry::RetryPolicy;
use crate::scraper::AttractionRecord;
use crate::sink::traits::{Embedder, SinkError, SinkResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prompt text embedded for one record
pub fn embedding_prompt(record: &AttractionRecord) -> String {
    let tags = record.tags.join(", ");
    [
        record.name.as_str(),
        record.kind.as_str(),
        record.description.as_str(),
        tags.as_str(),
    ]
    .join(" ")
}

/// Embeds every record, `batch_size` prompts per call, preserving order
pub async fn embed_records(
    embedder: &dyn Embedder,
    records: &[AttractionRecord],
    batch_size: usize,
) -> SinkResult<Vec<Vec<f32>>> {
    let prompts: Vec<String> = records.iter().map(embedding_prompt).collect();
    let mut embeddings = Vec::with_capacity(prompts.len());

    for batch in prompts.chunks(batch_size.max(1)) {
        let vectors = embedder.embed(batch).await?;
        if vectors.len() != batch.len() {
            return Err(SinkError::Response(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                vectors.len()
            )));
        }
        embeddings.extend(vectors);
    }

    tracing::debug!("Generated {} embeddings", embeddings.len());
    Ok(embeddings)
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    http: Client,
    api_url: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl OpenAiEmbedder {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> SinkResult<Self> {
        let api_url = api_url.into();
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|source| SinkError::Http {
                url: api_url.clone(),
                source,
            })?;

        Ok(Self {
            http,
            api_url,
            api_key: api_key.into(),
            model: model.into(),
            retry: RetryPolicy::embedding(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request(&self, inputs: &[String]) -> SinkResult<Vec<Vec<f32>>> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: inputs,
            })
            .send()
            .await
            .map_err(|source| SinkError::Http {
                url: self.api_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status {
                url: self.api_url.clone(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|source| SinkError::Http {
            url: self.api_url.clone(),
            source,
        })?;
        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, inputs: &[String]) -> SinkResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        self.retry
            .run(SinkError::is_transient, || self.request(inputs))
            .await
    }
}
