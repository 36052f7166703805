//! Core data models for weather-cache
//!
//! Mirrors the subset of the Visual Crossing Timeline response the service
//! returns and caches. Field names follow the provider's camelCase JSON, so
//! the cached bytes and the origin body share one schema.

pub mod weather;

pub use weather::{cache_key, ClientBuildError, FetchError, WeatherClient, WeatherConfig};

use serde::{Deserialize, Serialize};

/// Weather for one location, as returned by the origin
///
/// The cache treats this as an opaque payload: it is stored and replaced
/// whole, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResponse {
    /// Latitude coordinate
    pub latitude: f64,
    /// Longitude coordinate
    pub longitude: f64,
    /// Full address the provider resolved the query to
    pub resolved_address: String,
    /// The location as queried
    pub address: String,
    /// IANA timezone name of the location
    pub timezone: String,
    /// Daily forecasts, in chronological order
    pub days: Vec<DayForecast>,
}

/// Forecast for a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayForecast {
    /// Date in `YYYY-MM-DD` form
    pub datetime: String,
    /// Start of the day as a Unix timestamp
    pub datetime_epoch: i64,
    /// Maximum temperature
    pub tempmax: f64,
    /// Minimum temperature
    pub tempmin: f64,
    /// Mean temperature
    pub temp: f64,
    /// Local sunrise time (`HH:MM:SS`); absent during polar day/night
    pub sunrise: Option<String>,
    pub sunrise_epoch: Option<i64>,
    /// Local sunset time (`HH:MM:SS`); absent during polar day/night
    pub sunset: Option<String>,
    pub sunset_epoch: Option<i64>,
    /// Moon phase in the range 0..1
    pub moonphase: f64,
    /// Human-readable summary
    pub description: String,
    /// Provider icon identifier
    pub icon: String,
    /// Where the data came from (e.g. "fcst", "obs")
    pub source: String,
    /// Hourly forecasts, in chronological order
    pub hours: Vec<HourForecast>,
}

/// Forecast for a single hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourForecast {
    /// Time in `HH:MM:SS` form
    pub datetime: String,
    pub datetime_epoch: i64,
    /// Temperature
    pub temp: f64,
    /// Feels-like temperature
    pub feelslike: f64,
    /// Provider icon identifier
    pub icon: String,
}
