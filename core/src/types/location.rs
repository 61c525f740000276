use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::lenient;

/// Postal address attached to a `Location`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Address {
    /// Street-level name, e.g. "10 rue de Rivoli".
    pub name: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    pub fn new(name: &str, city: &str, postal_code: &str, country: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            city: Some(city.to_string()),
            postal_code: Some(postal_code.to_string()),
            country: Some(country.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Location {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<Address>,
}

impl Location {
    pub fn new(lat: f64, lng: f64, address: Address) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            address: Some(address),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// One point of a ride's route.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimestampedPoint {
    #[serde(rename = "timestamp", deserialize_with = "lenient::epoch")]
    pub date: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
}
