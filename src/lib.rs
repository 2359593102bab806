//! Attraction Harvester: a resumable point-of-interest harvester
//!
//! This crate walks a checkpointed list of cities, resolves each one against a
//! travel-data provider, pages through its attraction listing, fetches and
//! parses every attraction's detail payload, and hands the canonical records to
//! embedding, backup and vector-index collaborators.

pub mod cache;
pub mod config;
pub mod pipeline;
pub mod retry;
pub mod scraper;
pub mod sink;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Provider returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Undecodable response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("No provider location within range of {city}, {country}")]
    UnresolvedLocation { city: String, country: String },

    #[error("Checkpoint error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl HarvestError {
    /// Returns true for provider failures that are worth another attempt
    ///
    /// Transport failures, throttling (429), server errors (5xx) and bodies
    /// that are not valid JSON (usually an interstitial page served while
    /// throttled) are transient. Everything else fails fast.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Decode { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid JSON document {path}: {source}")]
    Document {
        path: String,
        source: serde_json::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Template {template} has no field at {pointer}")]
    MissingTemplateField { template: String, pointer: String },

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),

    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::{CityTask, TaskStatus, WorkCache};
pub use config::Config;
pub use retry::RetryPolicy;
pub use scraper::{AttractionRecord, AttractionRef, LocationId, Scraper};
