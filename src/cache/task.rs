/// City task definitions for the checkpointed work queue
///
/// A task is one city to harvest. Its two flags are the only mutable state and
/// are only ever changed by the work cache.
use serde::{Deserialize, Serialize};
use std::fmt;

/// One city entry of the checkpoint document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityTask {
    /// City name as passed to the provider search
    pub city: String,

    /// State or region, when the source list has one
    #[serde(default)]
    pub state: Option<String>,

    /// Country name
    pub country: String,

    /// Approximate latitude of the city centre
    pub lat: f64,

    /// Approximate longitude of the city centre
    pub lng: f64,

    /// Partition key for backups, failure logs and the vector index
    pub namespace: String,

    /// Set once the city has been handed to a harvest run
    #[serde(default)]
    pub processed: bool,

    /// Set once the harvest for this city completed
    #[serde(default)]
    pub success: bool,
}

impl CityTask {
    /// Creates an unprocessed task
    pub fn new(
        city: impl Into<String>,
        state: Option<String>,
        country: impl Into<String>,
        lat: f64,
        lng: f64,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            state,
            country: country.into(),
            lat,
            lng,
            namespace: namespace.into(),
            processed: false,
            success: false,
        }
    }

    /// Returns the derived status of this task
    pub fn status(&self) -> TaskStatus {
        match (self.processed, self.success) {
            (false, _) => TaskStatus::Pending,
            (true, true) => TaskStatus::Succeeded,
            (true, false) => TaskStatus::Failed,
        }
    }

    /// Returns the state name, or an empty string when there is none
    pub fn state_or_empty(&self) -> &str {
        self.state.as_deref().unwrap_or("")
    }
}

/// Derived view over the `processed`/`success` flag pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Not yet handed to any run
    Pending,

    /// Harvested and handed to every collaborator
    Succeeded,

    /// Attempted but did not complete; also the state a crash mid-run leaves
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_flags() {
        let mut task = CityTask::new("Lyon", None, "France", 45.76, 4.83, "lyon-fr");
        assert_eq!(task.status(), TaskStatus::Pending);

        task.processed = true;
        assert_eq!(task.status(), TaskStatus::Failed);

        task.success = true;
        assert_eq!(task.status(), TaskStatus::Succeeded);
    }

    #[test]
    fn test_success_ignored_until_processed() {
        let mut task = CityTask::new("Lyon", None, "France", 45.76, 4.83, "lyon-fr");
        task.success = true;
        assert_eq!(task.status(), TaskStatus::Pending);
    }

    #[test]
    fn test_deserialize_fresh_city_list_entry() {
        let json = r#"{"city":"Austin","state":"Texas","country":"United States",
                       "lat":30.27,"lng":-97.74,"namespace":"austin-tx"}"#;
        let task: CityTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.state.as_deref(), Some("Texas"));
        assert!(!task.processed);
        assert!(!task.success);
    }

    #[test]
    fn test_null_state() {
        let json = r#"{"city":"Paris","state":null,"country":"France",
                       "lat":48.85,"lng":2.35,"namespace":"paris-fr",
                       "processed":true,"success":false}"#;
        let task: CityTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.state_or_empty(), "");
        assert_eq!(task.status(), TaskStatus::Failed);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", TaskStatus::Pending), "pending");
        assert_eq!(format!("{}", TaskStatus::Failed), "failed");
    }
}
