use crate::config::types::{
    CacheConfig, Config, EmbeddingConfig, HarvestConfig, OutputConfig, ProviderConfig,
    VectorIndexConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_provider_config(&config.provider)?;
    validate_harvest_config(&config.harvest)?;
    validate_cache_config(&config.cache)?;
    validate_output_config(&config.output)?;
    validate_embedding_config(&config.embedding)?;
    validate_vector_index_config(&config.vector_index)?;
    Ok(())
}

/// Validates provider configuration
fn validate_provider_config(config: &ProviderConfig) -> Result<(), ConfigError> {
    validate_http_url("provider api-url", &config.api_url)?;

    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    for (name, path) in [
        ("city-lookup-template", &config.city_lookup_template),
        ("listing-template", &config.listing_template),
        ("detail-template", &config.detail_template),
        ("headers-file", &config.headers_file),
    ] {
        require_non_empty(name, path)?;
    }

    if config.max_attractions == Some(0) {
        return Err(ConfigError::Validation(
            "max-attractions must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates harvest configuration
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.cities_per_run < 1 {
        return Err(ConfigError::Validation(format!(
            "cities-per-run must be >= 1, got {}",
            config.cities_per_run
        )));
    }

    if !config.match_distance_km.is_finite() || config.match_distance_km <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "match-distance-km must be a positive number, got {}",
            config.match_distance_km
        )));
    }

    if config.default_duration_minutes < 1 {
        return Err(ConfigError::Validation(
            "default-duration-minutes must be >= 1".to_string(),
        ));
    }

    if !(0.0..=5.0).contains(&config.default_rating) {
        return Err(ConfigError::Validation(format!(
            "default-rating must be between 0 and 5, got {}",
            config.default_rating
        )));
    }

    if config.default_review_count < 0 {
        return Err(ConfigError::Validation(format!(
            "default-review-count cannot be negative, got {}",
            config.default_review_count
        )));
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    require_non_empty("cache path", &config.path)
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    require_non_empty("backup-dir", &config.backup_dir)?;
    require_non_empty("error-log-dir", &config.error_log_dir)
}

/// Validates embedding configuration
fn validate_embedding_config(config: &EmbeddingConfig) -> Result<(), ConfigError> {
    validate_http_url("embedding api-url", &config.api_url)?;
    require_non_empty("embedding model", &config.model)?;
    require_non_empty("embedding api-key-env", &config.api_key_env)?;

    if config.batch_size < 1 || config.batch_size > 2048 {
        return Err(ConfigError::Validation(format!(
            "embedding batch-size must be between 1 and 2048, got {}",
            config.batch_size
        )));
    }

    Ok(())
}

/// Validates vector index configuration
fn validate_vector_index_config(config: &VectorIndexConfig) -> Result<(), ConfigError> {
    validate_http_url("vector-index api-url", &config.api_url)?;
    require_non_empty("vector-index api-key-env", &config.api_key_env)?;

    if config.batch_size < 1 || config.batch_size > 1000 {
        return Err(ConfigError::Validation(format!(
            "vector-index batch-size must be between 1 and 1000, got {}",
            config.batch_size
        )));
    }

    Ok(())
}

/// Validates that a URL parses and uses an HTTP(S) scheme
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, other
        ))),
    }
}

fn require_non_empty(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }
    Ok(())
}
