//! Activity duration text parsing

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Reasons a duration text could not be turned into minutes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("no number in duration '{0}'")]
    NoDigits(String),

    #[error("no time unit in duration '{0}'")]
    NoUnit(String),
}

fn digits() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").expect("digit pattern is valid"))
}

/// Converts a free-text duration into minutes rounded to the nearest five
///
/// Every integer in the text is averaged, so ranges become their midpoint.
/// Texts mentioning hours are scaled by 60; texts mentioning minutes are
/// taken as-is. Halves round up.
///
/// # Example
///
/// ```
/// use attraction_harvester::scraper::parse_duration_minutes;
///
/// assert_eq!(parse_duration_minutes("More than 3 hours").unwrap(), 180);
/// assert_eq!(parse_duration_minutes("15-20 minutes").unwrap(), 20);
/// ```
pub fn parse_duration_minutes(text: &str) -> Result<u32, DurationError> {
    let numbers: Vec<f64> = digits()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();
    if numbers.is_empty() {
        return Err(DurationError::NoDigits(text.to_string()));
    }
    let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;

    let lower = text.to_lowercase();
    let minutes = if lower.contains("hour") {
        mean * 60.0
    } else if lower.contains("min") {
        mean
    } else {
        return Err(DurationError::NoUnit(text.to_string()));
    };

    Ok(round_to_five(minutes))
}

fn round_to_five(minutes: f64) -> u32 {
    (5.0 * (minutes / 5.0 + 0.5).floor()) as u32
}
