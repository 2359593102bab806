//! Provider HTTP client
//!
//! This module owns every request sent to the travel-data provider:
//! - Building the reqwest client with the static header set
//! - POSTing batched query documents to the single API endpoint
//! - Classifying failures and retrying the transient ones

use crate::config::ProviderConfig;
use crate::retry::RetryPolicy;
use crate::scraper::templates::{load_headers, QueryTemplates};
use crate::{HarvestError, Result};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Builds an HTTP client that sends `headers` with every request
///
/// # Arguments
///
/// * `headers` - Static headers from the provider header document
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(headers: HeaderMap) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Everything needed to talk to the provider, passed into each operation
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: Client,
    api_url: String,
    templates: QueryTemplates,
    retry: RetryPolicy,
    concurrency: usize,
}

impl ProviderClient {
    /// Creates a client with the provider retry policy and a fan-out cap of 8
    pub fn new(http: Client, api_url: impl Into<String>, templates: QueryTemplates) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            templates,
            retry: RetryPolicy::provider(),
            concurrency: 8,
        }
    }

    /// Loads templates and headers and builds the HTTP client
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let templates = QueryTemplates::load(config)?;
        let headers = load_headers(Path::new(&config.headers_file))?;
        let http = build_http_client(headers).map_err(|source| HarvestError::Http {
            url: config.api_url.clone(),
            source,
        })?;

        Ok(Self::new(http, &config.api_url, templates)
            .with_concurrency(config.max_concurrent_requests as usize))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the maximum in-flight requests per fan-out phase (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn templates(&self) -> &QueryTemplates {
        &self.templates
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// POSTs a query document and returns the decoded JSON response
    ///
    /// Transport errors, HTTP 429, HTTP 5xx and undecodable bodies are
    /// retried under the client's policy; other failures return at once.
    pub async fn post_query(&self, body: &Value) -> Result<Value> {
        self.retry
            .run(HarvestError::is_transient, || self.send_once(body))
            .await
    }

    async fn send_once(&self, body: &Value) -> Result<Value> {
        let response = self
            .http
            .post(&self.api_url)
            .json(body)
            .send()
            .await
            .map_err(|source| HarvestError::Http {
                url: self.api_url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: self.api_url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|source| HarvestError::Http {
            url: self.api_url.clone(),
            source,
        })?;

        serde_json::from_slice(&bytes).map_err(|e| HarvestError::Decode {
            url: self.api_url.clone(),
            message: e.to_string(),
        })
    }
}
