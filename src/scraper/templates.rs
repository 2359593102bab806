//! Provider request templates
//!
//! The provider accepts batched JSON query documents. Three of them (city
//! lookup, listing page, attraction detail) are captured once into template
//! files, loaded at start-up, and parameterized per call by overwriting the
//! values at fixed JSON pointers. The header document is a flat JSON object
//! attached to every request.

use crate::config::{read_file, ProviderConfig};
use crate::scraper::discovery::PAGE_SIZE;
use crate::scraper::LocationId;
use crate::{ConfigError, ConfigResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::path::Path;

const CITY_QUERY: &str = "/0/variables/request/query";
const LISTING_GEO_IDS: [&str; 2] = [
    "/0/variables/request/routeParameters/geoId",
    "/0/variables/route/params/geoId",
];
const LISTING_OFFSETS: [&str; 2] = [
    "/0/variables/request/routeParameters/pagee",
    "/0/variables/route/params/pagee",
];
const DETAIL_CONTENT_ID: &str = "/0/variables/request/routeParameters/contentId";

/// The three parameterized request documents
#[derive(Debug, Clone)]
pub struct QueryTemplates {
    city_lookup: Value,
    listing: Value,
    detail: Value,
}

impl QueryTemplates {
    /// Loads the template files named in the provider configuration
    pub fn load(config: &ProviderConfig) -> ConfigResult<Self> {
        Self::from_documents(
            read_document(Path::new(&config.city_lookup_template))?,
            read_document(Path::new(&config.listing_template))?,
            read_document(Path::new(&config.detail_template))?,
        )
    }

    /// Builds templates from parsed documents, checking every substitution path
    pub fn from_documents(city_lookup: Value, listing: Value, detail: Value) -> ConfigResult<Self> {
        require_pointer("city lookup", &city_lookup, CITY_QUERY)?;
        for pointer in LISTING_GEO_IDS.iter().chain(LISTING_OFFSETS.iter()) {
            require_pointer("listing", &listing, pointer)?;
        }
        require_pointer("detail", &detail, DETAIL_CONTENT_ID)?;

        Ok(Self {
            city_lookup,
            listing,
            detail,
        })
    }

    /// City autocomplete request for a free-text query
    pub fn city_lookup(&self, query: &str) -> Value {
        let mut request = self.city_lookup.clone();
        substitute(&mut request, CITY_QUERY, Value::String(query.to_string()));
        request
    }

    /// Listing request for one page of a location's attractions
    ///
    /// The provider addresses pages by item offset, sent as a string.
    pub fn listing_page(&self, location: &LocationId, page: usize) -> Value {
        let offset = Value::String((page * PAGE_SIZE).to_string());
        let mut request = self.listing.clone();
        for pointer in LISTING_GEO_IDS {
            substitute(&mut request, pointer, location.as_value().clone());
        }
        for pointer in LISTING_OFFSETS {
            substitute(&mut request, pointer, offset.clone());
        }
        request
    }

    /// Detail request for one attraction id
    pub fn detail(&self, id: &Value) -> Value {
        let mut request = self.detail.clone();
        substitute(&mut request, DETAIL_CONTENT_ID, id.clone());
        request
    }
}

/// Loads the static header document into a header map
pub fn load_headers(path: &Path) -> ConfigResult<HeaderMap> {
    headers_from_document(&read_document(path)?)
}

/// Converts a flat JSON object of strings into request headers
pub fn headers_from_document(document: &Value) -> ConfigResult<HeaderMap> {
    let object = document.as_object().ok_or_else(|| {
        ConfigError::InvalidHeader("header document must be a JSON object".to_string())
    })?;

    let mut headers = HeaderMap::new();
    for (name, value) in object {
        let value = value.as_str().ok_or_else(|| {
            ConfigError::InvalidHeader(format!("value of '{}' must be a string", name))
        })?;
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ConfigError::InvalidHeader(format!("'{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ConfigError::InvalidHeader(format!("'{}': {}", name, e)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn read_document(path: &Path) -> ConfigResult<Value> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Document {
        path: path.display().to_string(),
        source,
    })
}

fn require_pointer(template: &str, document: &Value, pointer: &str) -> ConfigResult<()> {
    if document.pointer(pointer).is_none() {
        return Err(ConfigError::MissingTemplateField {
            template: template.to_string(),
            pointer: pointer.to_string(),
        });
    }
    Ok(())
}

// Paths are checked in `from_documents`, so the slot always exists.
fn substitute(document: &mut Value, pointer: &str, value: Value) {
    if let Some(slot) = document.pointer_mut(pointer) {
        *slot = value;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_templates() -> QueryTemplates {
        QueryTemplates::from_documents(
            json!([{"variables": {"request": {"query": ""}}}]),
            json!([{
                "variables": {
                    "request": {"routeParameters": {"geoId": 0, "pagee": "0"}},
                    "route": {"params": {"geoId": 0, "pagee": "0"}}
                }
            }]),
            json!([{"variables": {"request": {"routeParameters": {"contentId": 0}}}}]),
        )
        .unwrap()
    }

    #[test]
    fn test_city_lookup_substitution() {
        let request = sample_templates().city_lookup("Springfield, United States");
        assert_eq!(
            request.pointer(CITY_QUERY).unwrap(),
            "Springfield, United States"
        );
    }

    #[test]
    fn test_listing_substitutes_both_copies() {
        let request = sample_templates().listing_page(&LocationId(json!(1001)), 2);

        for pointer in LISTING_GEO_IDS {
            assert_eq!(request.pointer(pointer).unwrap(), &json!(1001));
        }
        for pointer in LISTING_OFFSETS {
            assert_eq!(request.pointer(pointer).unwrap(), &json!("60"));
        }
    }

    #[test]
    fn test_templates_are_not_mutated() {
        let templates = sample_templates();
        let _ = templates.detail(&json!(501));
        let request = templates.detail(&json!(777));
        assert_eq!(request.pointer(DETAIL_CONTENT_ID).unwrap(), &json!(777));
    }

    #[test]
    fn test_missing_pointer_is_config_error() {
        let result = QueryTemplates::from_documents(
            json!([{"variables": {}}]),
            json!([]),
            json!([]),
        );
        match result {
            Err(ConfigError::MissingTemplateField { template, pointer }) => {
                assert_eq!(template, "city lookup");
                assert_eq!(pointer, CITY_QUERY);
            }
            other => panic!("expected missing field, got {:?}", other),
        }
    }

    #[test]
    fn test_headers_from_document() {
        let headers = headers_from_document(&json!({
            "User-Agent": "Mozilla/5.0",
            "Accept-Language": "en-US"
        }))
        .unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["user-agent"], "Mozilla/5.0");

        assert!(headers_from_document(&json!(["not", "an", "object"])).is_err());
        assert!(headers_from_document(&json!({"X-Count": 3})).is_err());
    }
}
