//! City to provider location resolution

use crate::scraper::{LocationId, ProviderClient};
use crate::Result;
use serde_json::Value;

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

const RESULTS_POINTER: &str = "/0/data/Typeahead_autocomplete/results";
const LOCATION_ITEM: &str = "Typeahead_LocationItem";

/// Great-circle distance between two coordinates in kilometers
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Maps a city to a provider location id by nearest-match search
pub struct CityResolver<'a> {
    client: &'a ProviderClient,
    max_distance_km: f64,
}

impl<'a> CityResolver<'a> {
    pub fn new(client: &'a ProviderClient, max_distance_km: f64) -> Self {
        Self {
            client,
            max_distance_km,
        }
    }

    /// Resolves `"<city>, <country>"` near the given coordinates
    ///
    /// # Returns
    ///
    /// * `Ok(Some(id))` - First location candidate closer than the threshold
    /// * `Ok(None)` - No candidate qualified (logged as a warning)
    /// * `Err(HarvestError)` - The lookup request itself failed
    pub async fn resolve(
        &self,
        city: &str,
        country: &str,
        lat: f64,
        lng: f64,
    ) -> Result<Option<LocationId>> {
        let query = format!("{}, {}", city, country);
        let request = self.client.templates().city_lookup(&query);
        let response = self.client.post_query(&request).await?;

        let location = nearest_location(&response, lat, lng, self.max_distance_km);
        match &location {
            Some(id) => tracing::debug!("Resolved {} to location {}", query, id),
            None => tracing::warn!(
                "No provider location within {} km of {} ({}, {})",
                self.max_distance_km,
                query,
                lat,
                lng
            ),
        }
        Ok(location)
    }
}

/// Picks the first location candidate lying closer than `max_distance_km`
///
/// Candidates are considered in response order; non-location results and
/// candidates without coordinates or an id are skipped.
pub fn nearest_location(
    response: &Value,
    lat: f64,
    lng: f64,
    max_distance_km: f64,
) -> Option<LocationId> {
    let results = response.pointer(RESULTS_POINTER)?.as_array()?;

    results
        .iter()
        .filter(|item| item["__typename"] == LOCATION_ITEM)
        .find_map(|item| {
            let item_lat = item.pointer("/details/latitude")?.as_f64()?;
            let item_lng = item.pointer("/details/longitude")?.as_f64()?;
            let id = item.get("locationId")?;

            let distance = haversine_km(lat, lng, item_lat, item_lng);
            tracing::trace!("Candidate {} at {:.1} km", id, distance);
            (distance < max_distance_km).then(|| LocationId(id.clone()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(id: i64, lat: f64, lng: f64) -> Value {
        json!({
            "__typename": LOCATION_ITEM,
            "locationId": id,
            "details": {"latitude": lat, "longitude": lng}
        })
    }

    fn response(results: Vec<Value>) -> Value {
        json!([{"data": {"Typeahead_autocomplete": {"results": results}}}])
    }

    #[test]
    fn test_haversine_known_distance() {
        // Paris to London
        let d = haversine_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((d - 343.5).abs() < 2.0, "got {}", d);
        assert_eq!(haversine_km(10.0, 10.0, 10.0, 10.0), 0.0);
    }

    #[test]
    fn test_picks_candidate_within_threshold() {
        // ~200 km north, then ~10 km north
        let response = response(vec![candidate(1, 1.8, 0.0), candidate(2, 0.09, 0.0)]);
        let id = nearest_location(&response, 0.0, 0.0, 50.0);
        assert_eq!(id, Some(LocationId(json!(2))));
    }

    #[test]
    fn test_first_qualifying_candidate_wins() {
        let response = response(vec![candidate(7, 0.3, 0.0), candidate(8, 0.01, 0.0)]);
        let id = nearest_location(&response, 0.0, 0.0, 50.0);
        assert_eq!(id, Some(LocationId(json!(7))));
    }

    #[test]
    fn test_nothing_within_threshold() {
        let response = response(vec![candidate(1, 1.8, 0.0)]);
        assert_eq!(nearest_location(&response, 0.0, 0.0, 50.0), None);
    }

    #[test]
    fn test_skips_other_types_and_missing_coordinates() {
        let response = response(vec![
            json!({"__typename": "Typeahead_QueryItem", "locationId": 3,
                   "details": {"latitude": 0.0, "longitude": 0.0}}),
            json!({"__typename": LOCATION_ITEM, "locationId": 4, "details": {}}),
            candidate(5, 0.05, 0.05),
        ]);
        assert_eq!(
            nearest_location(&response, 0.0, 0.0, 50.0),
            Some(LocationId(json!(5)))
        );
    }

    #[test]
    fn test_malformed_response() {
        assert_eq!(nearest_location(&json!({"errors": []}), 0.0, 0.0, 50.0), None);
    }
}
