//! Read-through weather client
//!
//! `WeatherClient` answers weather lookups from the cache when it can and
//! from the Visual Crossing Timeline API when it must, storing fresh origin
//! responses for later callers. Cache trouble never fails a lookup: it only
//! costs an origin round-trip.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Url};
use thiserror::Error;
use tracing::{debug, warn};

use super::WeatherResponse;
use crate::cache::{Cache, CacheError};

/// Base URL for the Visual Crossing Timeline API
pub const DEFAULT_BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline/";

/// How long a fetched response stays in the cache
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Upper bound on a single origin request
pub const DEFAULT_ORIGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Unit system requested from the origin
pub const DEFAULT_UNIT_GROUP: &str = "metric";

/// Namespace for weather entries in the cache
const KEY_PREFIX: &str = "weather";

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum FetchError {
    /// The location was empty or only whitespace
    #[error("location must not be empty")]
    InvalidLocation,

    /// The origin could not be reached or did not answer in time
    #[error("weather origin unreachable: {0}")]
    OriginUnreachable(#[source] reqwest::Error),

    /// The origin answered with a non-success status
    #[error("weather origin returned status {0}")]
    OriginRejected(u16),

    /// The origin answered 2xx but the body did not match the schema
    #[error("failed to decode weather response: {0}")]
    DecodeFailed(#[source] serde_json::Error),
}

/// Errors that can occur when building a `WeatherClient`
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The base URL is not http(s) or cannot have a location appended to its path
    #[error("invalid base URL '{0}': must be an absolute http(s) URL")]
    InvalidBaseUrl(String),

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Checks that `url` can serve as the origin base URL
///
/// The location is appended as a path segment, which needs an http(s) URL
/// with a hierarchical path (not e.g. `mailto:` or `data:`).
pub fn check_base_url(url: &Url) -> Result<(), ClientBuildError> {
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ClientBuildError::InvalidBaseUrl(url.to_string()));
    }
    Ok(())
}

/// Derives the cache key for a location
///
/// The location is used byte-for-byte: "London" and "london" are different keys.
pub fn cache_key(location: &str) -> String {
    format!("{}:{}", KEY_PREFIX, location)
}

/// Settings for reaching the origin and caching its answers
#[derive(Clone)]
pub struct WeatherConfig {
    /// Origin endpoint; the location is appended as a path segment
    pub base_url: Url,
    /// Provider API key, sent as the `key` query parameter
    pub api_key: String,
    /// Provider unit group (`metric`, `us`, `uk`, `base`)
    pub unit_group: String,
    /// TTL for cached responses
    pub cache_ttl: Duration,
    /// Upper bound on each origin request
    pub origin_timeout: Duration,
}

impl fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("unit_group", &self.unit_group)
            .field("cache_ttl", &self.cache_ttl)
            .field("origin_timeout", &self.origin_timeout)
            .finish()
    }
}

impl WeatherConfig {
    /// Create a config for the public Visual Crossing endpoint with default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_key: api_key.into(),
            unit_group: DEFAULT_UNIT_GROUP.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            origin_timeout: DEFAULT_ORIGIN_TIMEOUT,
        }
    }

    /// Point the client at a different origin
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Override how long fetched responses are cached
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Override the origin request timeout
    pub fn with_origin_timeout(mut self, timeout: Duration) -> Self {
        self.origin_timeout = timeout;
        self
    }

    /// Override the unit group requested from the origin
    pub fn with_unit_group(mut self, unit_group: impl Into<String>) -> Self {
        self.unit_group = unit_group.into();
        self
    }
}

/// Cache-aside client for weather-by-location
///
/// Holds only immutable configuration after construction, so one instance
/// can be shared behind an `Arc` by any number of concurrent callers.
/// Concurrent misses for the same location each go to the origin.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    cache: Cache,
    config: WeatherConfig,
}

impl WeatherClient {
    /// Create a new WeatherClient
    ///
    /// # Returns
    /// * `Err(ClientBuildError::InvalidBaseUrl)` if the base URL cannot take a location segment
    /// * `Err(ClientBuildError::Http)` if the HTTP client cannot be built (e.g. the
    ///   TLS backend fails to initialise)
    pub fn new(config: WeatherConfig, cache: Cache) -> Result<Self, ClientBuildError> {
        check_base_url(&config.base_url)?;
        let client = Client::builder()
            .user_agent(concat!("weather-cache/", env!("CARGO_PKG_VERSION")))
            .timeout(config.origin_timeout)
            .build()?;

        Self::with_client(client, config, cache)
    }

    /// Create a new WeatherClient with a custom HTTP client
    pub fn with_client(
        client: Client,
        config: WeatherConfig,
        cache: Cache,
    ) -> Result<Self, ClientBuildError> {
        check_base_url(&config.base_url)?;
        Ok(Self {
            client,
            cache,
            config,
        })
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    /// Fetch weather for a location, from the cache if possible
    ///
    /// # Arguments
    /// * `location` - Free-form place name or `lat,lon`, passed to the origin as-is
    ///
    /// # Returns
    /// * `Ok(WeatherResponse)` - From the cache on a hit, otherwise fresh from the origin
    /// * `Err(FetchError)` - If the location is blank or the origin fetch fails
    pub async fn get_weather(&self, location: &str) -> Result<WeatherResponse, FetchError> {
        if location.trim().is_empty() {
            return Err(FetchError::InvalidLocation);
        }

        let key = cache_key(location);

        match self.cache.get::<WeatherResponse>(&key).await {
            Ok(Some(weather)) => {
                debug!(location, key = %key, "cache hit");
                return Ok(weather);
            }
            Ok(None) => {
                debug!(location, key = %key, "cache miss, fetching from origin");
            }
            Err(err) => {
                warn!(location, key = %key, error = %err, "cache lookup failed, fetching from origin");
            }
        }

        let weather = self.fetch_origin(location).await?;

        if let Err(err) = self.cache.set(&key, &weather, self.config.cache_ttl).await {
            warn!(location, key = %key, error = %err, "failed to cache weather response");
        }

        Ok(weather)
    }

    /// Drop the cached response for a location, if any
    pub async fn invalidate(&self, location: &str) -> Result<(), CacheError> {
        self.cache.delete(&cache_key(location)).await
    }

    /// Request weather for a location straight from the origin
    async fn fetch_origin(&self, location: &str) -> Result<WeatherResponse, FetchError> {
        let response = self
            .client
            .get(self.origin_url(location))
            .query(&[
                ("unitGroup", self.config.unit_group.as_str()),
                ("include", "hours"),
                ("contentType", "json"),
                ("key", self.config.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::OriginUnreachable(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(location, status = status.as_u16(), "origin rejected request");
            return Err(FetchError::OriginRejected(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::OriginUnreachable(e.without_url()))?;

        serde_json::from_slice(&body).map_err(FetchError::DecodeFailed)
    }

    /// Build the origin URL with `location` appended as one encoded path segment
    fn origin_url(&self, location: &str) -> Url {
        let mut url = self.config.base_url.clone();
        // Cannot fail: construction rejects cannot-be-a-base URLs.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(location);
        }
        url
    }
}
