//! Detail payload parser
//!
//! Converts one raw attraction detail response into an [`AttractionRecord`].
//! Every field is extracted independently and falls back to a default when
//! its part of the payload is missing or malformed. The description is the
//! exception: without it the record is rejected.

use crate::cache::CityTask;
use crate::config::HarvestConfig;
use crate::scraper::duration::parse_duration_minutes;
use crate::scraper::{AttractionRecord, AttractionRef};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};
use thiserror::Error;

const RESULT_POINTER: &str = "/0/data/Result/0";
const ABOUT_GROUP: &str = "WebPresentation_AttractionAboutSectionGroup";
const ABOUT_CONTENT: &str = "WebPresentation_AboutContentWeb";
const OVERVIEW_SECTION: &str = "WebPresentation_PoiOverviewWeb";
const CONTACT_LINK: &str = "WebPresentation_ContactLink";
const HOURS_SECTION: &str = "WebPresentation_PoiHoursWeb";

/// Characters of padding the provider wraps around base64-encoded text
const WRAPPER_LEN: usize = 4;

/// Reasons a detail payload cannot produce a record
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("payload has no result object")]
    MissingResult,

    #[error("payload has no decodable description")]
    MissingDescription,
}

/// Values used when a payload omits a field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseDefaults {
    pub duration_minutes: u32,
    pub rating: f64,
    pub review_count: i64,
}

impl Default for ParseDefaults {
    fn default() -> Self {
        Self {
            duration_minutes: 45,
            rating: 2.5,
            review_count: 0,
        }
    }
}

impl From<&HarvestConfig> for ParseDefaults {
    fn from(config: &HarvestConfig) -> Self {
        Self {
            duration_minutes: config.default_duration_minutes,
            rating: config.default_rating,
            review_count: config.default_review_count,
        }
    }
}

/// Turns detail payloads into canonical records
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    defaults: ParseDefaults,
}

impl ResponseParser {
    pub fn new(defaults: ParseDefaults) -> Self {
        Self { defaults }
    }

    /// Parses the detail payload of `attraction`, found while harvesting `task`
    ///
    /// # Returns
    ///
    /// * `Ok(AttractionRecord)` - Record with defaults filled in
    /// * `Err(ParseError)` - The payload has no result or no description
    pub fn parse(
        &self,
        attraction: &AttractionRef,
        task: &CityTask,
        payload: &Value,
    ) -> Result<AttractionRecord, ParseError> {
        let result = payload.pointer(RESULT_POINTER).ok_or(ParseError::MissingResult)?;
        let description = extract_description(result).ok_or(ParseError::MissingDescription)?;

        let json_ld = structured_metadata(result);
        let (latitude, longitude) = extract_coordinates(result).unwrap_or((task.lat, task.lng));

        Ok(AttractionRecord {
            provider_id: attraction.provider_id(),
            name: attraction.name.clone(),
            kind: string_at(&json_ld, "/@type"),
            address: string_at(&json_ld, "/address/streetAddress"),
            city: task.city.clone(),
            state: task.state_or_empty().to_string(),
            country: task.country.clone(),
            zip_code: string_at(&json_ld, "/address/postalCode"),
            rating: json_ld
                .pointer("/aggregateRating/ratingValue")
                .and_then(as_f64)
                .unwrap_or(self.defaults.rating),
            review_count: json_ld
                .pointer("/aggregateRating/reviewCount")
                .and_then(as_i64)
                .unwrap_or(self.defaults.review_count),
            image_url: string_at(&json_ld, "/image"),
            latitude,
            longitude,
            description,
            activity_duration: self.extract_duration(result, &attraction.name),
            website: extract_website(result).unwrap_or_default(),
            tags: extract_tags(result),
            hours: extract_hours(result).unwrap_or_default(),
        })
    }

    fn extract_duration(&self, result: &Value, name: &str) -> u32 {
        let Some(text) = duration_text(result) else {
            return self.defaults.duration_minutes;
        };

        match parse_duration_minutes(text) {
            Ok(minutes) => minutes,
            Err(e) => {
                tracing::warn!("Unparseable duration for {}: {}", name, e);
                self.defaults.duration_minutes
            }
        }
    }
}

/// `container.jsonLd` is itself a JSON document encoded as a string
fn structured_metadata(result: &Value) -> Value {
    result
        .pointer("/container/jsonLd")
        .and_then(Value::as_str)
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(Value::Null)
}

fn extract_coordinates(result: &Value) -> Option<(f64, f64)> {
    let center = result.pointer("/detailSectionGroups/3/staticMap/center")?;
    Some((center.get("latitude")?.as_f64()?, center.get("longitude")?.as_f64()?))
}

fn extract_description(result: &Value) -> Option<String> {
    result
        .get("detailSectionGroups")?
        .as_array()?
        .iter()
        .filter(|group| group["__typename"] == ABOUT_GROUP)
        .find_map(|group| {
            let encoded = group.pointer("/about/primary/about")?.as_str()?;
            Some(decode_wrapped(encoded)?.replace('\n', ""))
        })
}

fn duration_text(result: &Value) -> Option<&str> {
    result
        .pointer("/detailSectionGroups/1/about/primary/content")?
        .as_array()?
        .iter()
        .find(|item| item["__typename"] == ABOUT_CONTENT && item["identifier"] == "DURATION")?
        .pointer("/item/text/text")?
        .as_str()
}

fn overview_sections(result: &Value) -> impl Iterator<Item = &Value> {
    result
        .pointer("/detailSectionGroups/0/detailSections")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn extract_tags(result: &Value) -> Vec<String> {
    overview_sections(result)
        .find_map(|section| section.pointer("/tags/text")?.as_str())
        .map(|text| {
            text.split('•')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn extract_website(result: &Value) -> Option<String> {
    overview_sections(result)
        .filter(|section| section["__typename"] == OVERVIEW_SECTION)
        .filter_map(|section| section.get("contactLinks")?.as_array())
        .flatten()
        .filter(|link| link["__typename"] == CONTACT_LINK && link["linkType"] == "WEBSITE")
        .find_map(|link| decode_wrapped(link.pointer("/link/externalUrl")?.as_str()?))
}

fn extract_hours(result: &Value) -> Option<String> {
    overview_sections(result)
        .filter(|section| section["__typename"] == HOURS_SECTION)
        .find_map(|section| {
            let schedule = section.pointer("/poiHours/fullSchedule")?.as_array()?;
            let mut hours = Map::new();
            for day in schedule {
                let label = day.pointer("/day/text")?.as_str()?;
                let intervals = day.get("intervals")?.clone();
                hours.insert(label.to_string(), intervals);
            }
            Some(Value::Object(hours).to_string())
        })
}

/// Base64-decodes provider text and strips its four-character wrapper on each end
pub fn decode_wrapped(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    let text = String::from_utf8(bytes).ok()?;

    let len = text.chars().count();
    let keep = len.saturating_sub(2 * WRAPPER_LEN);
    Some(text.chars().skip(WRAPPER_LEN).take(keep).collect())
}

fn string_at(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}
