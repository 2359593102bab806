//! Scraper coordinator - per-city harvest orchestration
//!
//! A single city harvest runs these steps in order:
//! - Resolve the city to a provider location id
//! - Discover how many attractions it lists and how many pages that takes
//! - Fetch attraction ids page by page
//! - Fetch every attraction's detail payload
//! - Parse the payloads into records, dropping the ones that fail

use crate::cache::CityTask;
use crate::config::Config;
use crate::scraper::discovery::AttractionIndexDiscoverer;
use crate::scraper::fetcher::DetailFetcher;
use crate::scraper::parser::{ParseDefaults, ResponseParser};
use crate::scraper::resolver::CityResolver;
use crate::scraper::{CityHarvest, HarvestReport, ProviderClient};
use crate::{HarvestError, Result};

/// Resolve, discover, fetch and parse for one city at a time
#[derive(Debug, Clone)]
pub struct Scraper {
    client: ProviderClient,
    parser: ResponseParser,
    match_distance_km: f64,
    max_attractions: Option<usize>,
}

impl Scraper {
    pub fn new(client: ProviderClient, parser: ResponseParser, match_distance_km: f64) -> Self {
        Self {
            client,
            parser,
            match_distance_km,
            max_attractions: None,
        }
    }

    /// Builds a scraper from the `[provider]` and `[harvest]` sections
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ProviderClient::from_config(&config.provider)?;
        let parser = ResponseParser::new(ParseDefaults::from(&config.harvest));
        Ok(Self::new(client, parser, config.harvest.match_distance_km)
            .with_max_attractions(config.provider.max_attractions.map(|n| n as usize)))
    }

    /// Caps the number of attractions harvested per city
    pub fn with_max_attractions(mut self, cap: Option<usize>) -> Self {
        self.max_attractions = cap;
        self
    }

    pub fn client(&self) -> &ProviderClient {
        &self.client
    }

    /// Harvests every attraction of one city
    ///
    /// # Returns
    ///
    /// * `Ok(CityHarvest)` - Parsed records in discovery order, plus counts
    /// * `Err(HarvestError::UnresolvedLocation)` - No provider location matched
    /// * `Err(HarvestError)` - A lookup, index or listing request failed
    pub async fn harvest(&self, task: &CityTask) -> Result<CityHarvest> {
        let location = CityResolver::new(&self.client, self.match_distance_km)
            .resolve(&task.city, &task.country, task.lat, task.lng)
            .await?
            .ok_or_else(|| HarvestError::UnresolvedLocation {
                city: task.city.clone(),
                country: task.country.clone(),
            })?;

        let plan = AttractionIndexDiscoverer::new(&self.client)
            .discover(&location, self.max_attractions)
            .await?;

        let mut report = HarvestReport {
            namespace: task.namespace.clone(),
            expected: plan.max_attractions,
            ..HarvestReport::default()
        };

        if plan.pages == 0 {
            tracing::info!("{} lists no attractions", task.city);
            return Ok(CityHarvest {
                records: Vec::new(),
                report,
            });
        }

        let fetcher = DetailFetcher::new(&self.client);
        let refs = fetcher.fetch_refs(&location, &plan).await?;
        report.discovered = refs.len();

        let payloads = fetcher.fetch_details(&refs).await;
        report.fetched = payloads.iter().filter(|p| p.is_some()).count();

        let mut records = Vec::with_capacity(refs.len());
        for (attraction, payload) in refs.iter().zip(payloads) {
            let Some(payload) = payload else { continue };
            match self.parser.parse(attraction, task, &payload) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(
                    "Dropping attraction {} ({}): {}",
                    attraction.name,
                    attraction.provider_id(),
                    e
                ),
            }
        }
        report.parsed = records.len();

        tracing::info!(
            "Scraped {} / {} attractions for {} ({} dropped)",
            report.parsed,
            report.expected,
            task.city,
            report.dropped()
        );

        Ok(CityHarvest { records, report })
    }
}
