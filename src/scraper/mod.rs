//! Scraper module - travel-data provider harvesting
//!
//! This module contains everything that talks to the provider:
//! - Request templates and the shared HTTP client
//! - City resolution by nearest location match
//! - Attraction index discovery and concurrent fetching
//! - Detail payload parsing into canonical records
//! - The per-city orchestration in [`Scraper`]

mod client;
mod coordinator;
mod discovery;
mod duration;
mod fetcher;
mod parser;
mod resolver;
mod templates;
mod types;

pub use client::{build_http_client, ProviderClient};
pub use coordinator::Scraper;
pub use discovery::{
    pages_needed, total_results, AttractionIndexDiscoverer, IndexPlan, DEFAULT_TOTAL_RESULTS,
    PAGE_SIZE,
};
pub use duration::{parse_duration_minutes, DurationError};
pub use fetcher::{parse_listing_page, DetailFetcher};
pub use parser::{decode_wrapped, ParseDefaults, ParseError, ResponseParser};
pub use resolver::{haversine_km, nearest_location, CityResolver, EARTH_RADIUS_KM};
pub use templates::{headers_from_document, load_headers, QueryTemplates};
pub use types::{AttractionRecord, AttractionRef, CityHarvest, HarvestReport, LocationId};
