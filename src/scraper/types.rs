use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Provider identifier of a resolved city
///
/// Kept as the raw JSON scalar the provider returned so it can be written
/// back into listing requests without reinterpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub Value);

impl LocationId {
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&scalar_to_string(&self.0))
    }
}

/// An attraction discovered on a listing page
#[derive(Debug, Clone, PartialEq)]
pub struct AttractionRef {
    /// Raw provider id, substituted verbatim into detail requests
    pub id: Value,
    pub name: String,
}

impl AttractionRef {
    pub fn new(id: Value, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Provider id rendered as text
    pub fn provider_id(&self) -> String {
        scalar_to_string(&self.id)
    }
}

/// Canonical attraction record handed to the downstream collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttractionRecord {
    pub provider_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub rating: f64,
    pub review_count: i64,
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: String,
    /// Minutes, rounded to the nearest five
    pub activity_duration: u32,
    pub website: String,
    pub tags: Vec<String>,
    /// JSON object of day label to intervals, in schedule order
    pub hours: String,
}

/// Counts collected while harvesting one city
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub namespace: String,
    /// Effective number of attractions the listing promised
    pub expected: usize,
    /// Attractions found across listing pages
    pub discovered: usize,
    /// Detail payloads fetched successfully
    pub fetched: usize,
    /// Records parsed successfully
    pub parsed: usize,
}

impl HarvestReport {
    /// Attractions lost to detail fetch or parse failures
    pub fn dropped(&self) -> usize {
        self.discovered.saturating_sub(self.parsed)
    }
}

/// Output of a single city harvest
#[derive(Debug, Clone, Default)]
pub struct CityHarvest {
    pub records: Vec<AttractionRecord>,
    pub report: HarvestReport,
}

/// Renders a JSON scalar without quoting strings
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_id_rendering() {
        assert_eq!(AttractionRef::new(json!(501), "Zoo").provider_id(), "501");
        assert_eq!(AttractionRef::new(json!("d501"), "Zoo").provider_id(), "d501");
    }

    #[test]
    fn test_location_id_serializes_transparently() {
        let id = LocationId(json!(60745));
        assert_eq!(serde_json::to_value(&id).unwrap(), json!(60745));
        assert_eq!(id.to_string(), "60745");
    }

    #[test]
    fn test_record_uses_type_key() {
        let record = AttractionRecord {
            provider_id: "1".into(),
            name: "Museum".into(),
            kind: "TouristAttraction".into(),
            address: String::new(),
            city: "Boston".into(),
            state: "Massachusetts".into(),
            country: "United States".into(),
            zip_code: String::new(),
            rating: 2.5,
            review_count: 0,
            image_url: String::new(),
            latitude: 42.36,
            longitude: -71.06,
            description: "A museum".into(),
            activity_duration: 45,
            website: String::new(),
            tags: vec![],
            hours: String::new(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "TouristAttraction");
        assert_eq!(value["review_count"], 0);
        assert!(value.get("kind").is_none());
    }

    #[test]
    fn test_report_dropped() {
        let report = HarvestReport {
            discovered: 10,
            parsed: 7,
            ..HarvestReport::default()
        };
        assert_eq!(report.dropped(), 3);
    }
}
