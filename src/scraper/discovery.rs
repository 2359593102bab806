//! Attraction index discovery
//!
//! Reads the first listing page of a location to learn how many attractions
//! it has, and turns that into a page plan for the fetch phase.

use crate::scraper::{LocationId, ProviderClient};
use crate::Result;
use serde_json::Value;

/// Attractions per listing page
pub const PAGE_SIZE: usize = 30;

/// Total assumed when the listing carries no pagination section
pub const DEFAULT_TOTAL_RESULTS: usize = 30;

const SECTIONS_POINTER: &str = "/0/data/Result/0/sections";
const PAGINATION_SECTION: &str = "WebPresentation_PaginationLinksList";

/// How many attractions to harvest for a location and how many pages that takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexPlan {
    /// Total reported by the provider
    pub total_results: usize,
    /// Total after applying the optional cap
    pub max_attractions: usize,
    pub pages: usize,
}

impl IndexPlan {
    pub fn new(total_results: usize, cap: Option<usize>) -> Self {
        let max_attractions = match cap {
            Some(cap) => total_results.min(cap),
            None => total_results,
        };
        Self {
            total_results,
            max_attractions,
            pages: pages_needed(max_attractions),
        }
    }
}

/// Number of listing pages needed to cover `attractions`
pub fn pages_needed(attractions: usize) -> usize {
    attractions.div_ceil(PAGE_SIZE)
}

/// Reads `totalResults` from the last pagination section of a listing response
pub fn total_results(response: &Value) -> usize {
    response
        .pointer(SECTIONS_POINTER)
        .and_then(Value::as_array)
        .and_then(|sections| {
            sections
                .iter()
                .rev()
                .find(|section| section["__typename"] == PAGINATION_SECTION)
        })
        .and_then(|section| section.get("totalResults"))
        .and_then(Value::as_u64)
        .map(|total| total as usize)
        .unwrap_or(DEFAULT_TOTAL_RESULTS)
}

/// Determines the attraction count and page plan for a resolved location
pub struct AttractionIndexDiscoverer<'a> {
    client: &'a ProviderClient,
}

impl<'a> AttractionIndexDiscoverer<'a> {
    pub fn new(client: &'a ProviderClient) -> Self {
        Self { client }
    }

    pub async fn discover(&self, location: &LocationId, cap: Option<usize>) -> Result<IndexPlan> {
        let request = self.client.templates().listing_page(location, 0);
        let response = self.client.post_query(&request).await?;

        let plan = IndexPlan::new(total_results(&response), cap);
        tracing::debug!(
            "Location {} lists {} attractions, harvesting {} over {} pages",
            location,
            plan.total_results,
            plan.max_attractions,
            plan.pages
        );
        Ok(plan)
    }
}
