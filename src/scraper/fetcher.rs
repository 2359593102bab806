//! Concurrent listing and detail fetches
//!
//! Both phases fan out through an order-preserving bounded stream, so results
//! line up with the requests that produced them and at most
//! `ProviderClient::concurrency()` requests are in flight.

use crate::scraper::discovery::IndexPlan;
use crate::scraper::{AttractionRef, LocationId, ProviderClient};
use crate::Result;
use futures::stream::{self, StreamExt};
use serde_json::Value;

const SECTIONS_POINTER: &str = "/0/data/Result/0/sections";
const CARD_SECTION: &str = "WebPresentation_SingleFlexCardSection";

/// Fetches attraction ids by listing page, then their detail payloads
pub struct DetailFetcher<'a> {
    client: &'a ProviderClient,
}

impl<'a> DetailFetcher<'a> {
    pub fn new(client: &'a ProviderClient) -> Self {
        Self { client }
    }

    /// Fetches every listing page in the plan and returns refs in discovery order
    ///
    /// All pages are allowed to settle before a failed page fails the call.
    /// The concatenated list is truncated to `plan.max_attractions`.
    pub async fn fetch_refs(&self, location: &LocationId, plan: &IndexPlan) -> Result<Vec<AttractionRef>> {
        let client = self.client;
        let pages: Vec<Result<Vec<AttractionRef>>> = stream::iter(0..plan.pages)
            .map(|page| async move {
                let request = client.templates().listing_page(location, page);
                let response = client.post_query(&request).await?;
                let refs = parse_listing_page(&response);
                tracing::debug!("Listing page {} of {} yielded {} attractions", page, location, refs.len());
                Ok(refs)
            })
            .buffered(client.concurrency())
            .collect()
            .await;

        let mut refs = Vec::with_capacity(plan.max_attractions);
        for page in pages {
            refs.extend(page?);
        }
        refs.truncate(plan.max_attractions);
        Ok(refs)
    }

    /// Fetches the detail payload of every ref
    ///
    /// The result is positional: entry `i` belongs to `refs[i]`, and is `None`
    /// when that request exhausted its retries.
    pub async fn fetch_details(&self, refs: &[AttractionRef]) -> Vec<Option<Value>> {
        let client = self.client;
        stream::iter(refs)
            .map(|attraction| async move {
                let request = client.templates().detail(&attraction.id);
                match client.post_query(&request).await {
                    Ok(payload) => Some(payload),
                    Err(e) => {
                        tracing::warn!(
                            "Dropping attraction {} ({}): {}",
                            attraction.name,
                            attraction.provider_id(),
                            e
                        );
                        None
                    }
                }
            })
            .buffered(client.concurrency())
            .collect()
            .await
    }
}

/// Extracts `{id, name}` refs from one listing page, in page order
pub fn parse_listing_page(response: &Value) -> Vec<AttractionRef> {
    let Some(sections) = response.pointer(SECTIONS_POINTER).and_then(Value::as_array) else {
        return Vec::new();
    };

    sections
        .iter()
        .filter(|section| section["__typename"] == CARD_SECTION)
        .filter_map(|section| {
            let content = section.get("singleFlexCardContent")?;
            let id = content.pointer("/saveId/id")?;
            let name = content.pointer("/cardTitle/text")?.as_str()?;
            Some(AttractionRef::new(id.clone(), name))
        })
        .collect()
}
