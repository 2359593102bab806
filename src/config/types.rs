use serde::Deserialize;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    pub cache: CacheConfig,
    pub output: OutputConfig,
    pub embedding: EmbeddingConfig,
    #[serde(rename = "vector-index")]
    pub vector_index: VectorIndexConfig,
}

/// Travel-data provider endpoint and request documents
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Batched query endpoint every request is POSTed to
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Path to the city lookup (autocomplete) request template
    #[serde(rename = "city-lookup-template")]
    pub city_lookup_template: String,

    /// Path to the attraction listing request template
    #[serde(rename = "listing-template")]
    pub listing_template: String,

    /// Path to the attraction detail request template
    #[serde(rename = "detail-template")]
    pub detail_template: String,

    /// Path to the JSON object of static request headers
    #[serde(rename = "headers-file")]
    pub headers_file: String,

    /// Maximum in-flight requests within one fan-out phase
    #[serde(rename = "max-concurrent-requests", default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: u32,

    /// Optional cap on attractions harvested per city
    #[serde(rename = "max-attractions", default)]
    pub max_attractions: Option<u32>,
}

/// Per-run harvesting behavior and parser defaults
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Number of cities leased from the checkpoint per run
    #[serde(rename = "cities-per-run", default = "default_cities_per_run")]
    pub cities_per_run: u32,

    /// A provider location must lie closer than this to the city (km)
    #[serde(rename = "match-distance-km", default = "default_match_distance_km")]
    pub match_distance_km: f64,

    /// Activity duration used when a detail payload has none (minutes)
    #[serde(rename = "default-duration-minutes", default = "default_duration_minutes")]
    pub default_duration_minutes: u32,

    /// Rating used when a detail payload has none (out of 5)
    #[serde(rename = "default-rating", default = "default_rating")]
    pub default_rating: f64,

    /// Review count used when a detail payload has none
    #[serde(rename = "default-review-count", default)]
    pub default_review_count: i64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            cities_per_run: default_cities_per_run(),
            match_distance_km: default_match_distance_km(),
            default_duration_minutes: default_duration_minutes(),
            default_rating: default_rating(),
            default_review_count: 0,
        }
    }
}

/// Checkpoint location
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Path to the JSON checkpoint document
    pub path: String,
}

/// Local output locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the blob store receiving per-city backups
    #[serde(rename = "backup-dir")]
    pub backup_dir: String,

    /// Directory receiving per-city failure traces
    #[serde(rename = "error-log-dir")]
    pub error_log_dir: String,

    /// Whether an existing backup may be replaced
    #[serde(rename = "overwrite-backups", default = "default_true")]
    pub overwrite_backups: bool,
}

/// Embedding API settings
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// Embeddings endpoint
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Embedding model name
    pub model: String,

    /// Prompts sent per request
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_embedding_key_env")]
    pub api_key_env: String,
}

/// Vector index settings
#[derive(Debug, Clone, Deserialize)]
pub struct VectorIndexConfig {
    /// Index base URL; upserts go to `<api-url>/vectors/upsert`
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Vectors sent per upsert
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_index_key_env")]
    pub api_key_env: String,
}

fn default_max_concurrent_requests() -> u32 {
    8
}

fn default_cities_per_run() -> u32 {
    2
}

fn default_match_distance_km() -> f64 {
    50.0
}

fn default_duration_minutes() -> u32 {
    45
}

fn default_rating() -> f64 {
    2.5
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    100
}

fn default_embedding_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_index_key_env() -> String {
    "PINECONE_API_KEY".to_string()
}
