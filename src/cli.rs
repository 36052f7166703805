//! Command-line interface parsing for weather-cache
//!
//! Every option can also come from the environment (and therefore from a
//! `.env` file loaded at start-up). `Settings::from_cli` validates the raw
//! arguments and turns them into the configuration the client is built from.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use redis::IntoConnectionInfo;
use reqwest::Url;
use thiserror::Error;

use crate::data::weather::{check_base_url, DEFAULT_BASE_URL, DEFAULT_UNIT_GROUP};
use crate::data::WeatherConfig;

/// Longest accepted cache TTL (30 days)
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Error types for configuration validation
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API key was given on the command line or in `API_KEY`
    #[error("API_KEY env variable (or --api-key) is required")]
    MissingApiKey,

    /// The cache TTL must be positive and at most `MAX_CACHE_TTL_SECS`
    #[error("cache TTL must be between 1 and {} seconds", MAX_CACHE_TTL_SECS)]
    InvalidTtl,

    /// A timeout must be positive
    #[error("{0} timeout must be greater than zero")]
    InvalidTimeout(&'static str),

    /// The base URL could not be parsed or cannot carry a path
    #[error("invalid base URL '{0}': must be an absolute http(s) URL")]
    InvalidBaseUrl(String),

    /// The Redis URL could not be parsed
    #[error("invalid Redis URL: {0}")]
    InvalidRedisUrl(String),

    /// The bind address and port do not form a socket address
    #[error("invalid listen address '{0}'")]
    InvalidListenAddr(String),
}

/// weather-cache - Read-through Redis cache for the Visual Crossing weather API
#[derive(Parser, Debug)]
#[command(name = "weather-cache")]
#[command(about = "Serve and cache weather lookups from the Visual Crossing API")]
#[command(version)]
pub struct Cli {
    /// Visual Crossing API key
    #[arg(long, env = "API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Redis connection URL; without it an in-process cache is used
    #[arg(long, env = "REDIS_URL", hide_env_values = true, global = true)]
    pub redis_url: Option<String>,

    /// How long fetched responses stay cached, in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value_t = 7200, global = true)]
    pub cache_ttl_secs: u64,

    /// Origin endpoint; the location is appended as a path segment
    #[arg(long, env = "WEATHER_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Unit group requested from the origin (metric, us, uk, base)
    #[arg(long, env = "WEATHER_UNIT_GROUP", default_value = DEFAULT_UNIT_GROUP, global = true)]
    pub unit_group: String,

    /// Upper bound on each cache round-trip, in milliseconds
    #[arg(long, env = "CACHE_TIMEOUT_MS", default_value_t = 2000, global = true)]
    pub cache_timeout_ms: u64,

    /// Upper bound on each origin request, in seconds
    #[arg(long, env = "ORIGIN_TIMEOUT_SECS", default_value_t = 10, global = true)]
    pub origin_timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do once configured
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
    /// Look up weather for one location and print it as JSON
    Get {
        /// Place name or `lat,lon`
        location: String,
    },
    /// Remove the cached response for a location
    Evict {
        /// Place name or `lat,lon`, exactly as it was looked up
        location: String,
    },
}

/// Validated configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Settings {
    /// Client configuration
    pub weather: WeatherConfig,
    /// Redis URL, if a shared cache was requested
    pub redis_url: Option<String>,
    /// Upper bound on each cache round-trip
    pub cache_timeout: Duration,
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Settings)` with every value validated
    /// * `Err(ConfigError)` naming the first invalid value
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let api_key = cli
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        if cli.cache_ttl_secs == 0 || cli.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::InvalidTtl);
        }
        if cli.cache_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout("cache"));
        }
        if cli.origin_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("origin"));
        }

        let base_url = parse_base_url(&cli.base_url)?;

        let weather = WeatherConfig::new(api_key)
            .with_base_url(base_url)
            .with_unit_group(cli.unit_group.clone())
            .with_cache_ttl(Duration::from_secs(cli.cache_ttl_secs))
            .with_origin_timeout(Duration::from_secs(cli.origin_timeout_secs));

        let redis_url = cli
            .redis_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(parse_redis_url)
            .transpose()?;

        Ok(Settings {
            weather,
            redis_url,
            cache_timeout: Duration::from_millis(cli.cache_timeout_ms),
        })
    }
}

/// Parses the origin base URL, which must be http(s) and able to take path segments
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|_| ConfigError::InvalidBaseUrl(raw.to_string()))?;
    check_base_url(&url).map_err(|_| ConfigError::InvalidBaseUrl(raw.to_string()))?;
    Ok(url)
}

/// Checks that a Redis URL can be turned into connection settings
///
/// The error omits the URL itself, which may carry a password.
fn parse_redis_url(raw: &str) -> Result<String, ConfigError> {
    raw.into_connection_info()
        .map_err(|err| ConfigError::InvalidRedisUrl(err.to_string()))?;
    Ok(raw.to_string())
}

/// Combines a bind address and port into a socket address
pub fn listen_addr(bind: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    format!("{}:{}", bind, port)
        .parse()
        .map_err(|_| ConfigError::InvalidListenAddr(format!("{}:{}", bind, port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["weather-cache"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).expect("Arguments should parse")
    }

    #[test]
    fn test_get_subcommand_parses_location() {
        let cli = parse(&["--api-key", "k", "get", "London"]);
        assert_eq!(
            cli.command,
            Command::Get {
                location: "London".to_string()
            }
        );
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = parse(&["get", "Paris", "--api-key", "k", "--cache-ttl-secs", "60"]);
        assert_eq!(cli.api_key.as_deref(), Some("k"));
        assert_eq!(cli.cache_ttl_secs, 60);
    }

    #[test]
    fn test_settings_from_explicit_args() {
        let cli = parse(&[
            "--api-key",
            "abc",
            "--redis-url",
            "redis://localhost:6379/0",
            "--cache-ttl-secs",
            "600",
            "--cache-timeout-ms",
            "250",
            "--origin-timeout-secs",
            "3",
            "--unit-group",
            "us",
            "get",
            "Oslo",
        ]);
        let settings = Settings::from_cli(&cli).expect("Settings should be valid");

        assert_eq!(settings.weather.api_key, "abc");
        assert_eq!(settings.weather.unit_group, "us");
        assert_eq!(settings.weather.cache_ttl, Duration::from_secs(600));
        assert_eq!(settings.weather.origin_timeout, Duration::from_secs(3));
        assert_eq!(settings.cache_timeout, Duration::from_millis(250));
        assert_eq!(settings.redis_url.as_deref(), Some("redis://localhost:6379/0"));
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let mut cli = parse(&["get", "Oslo"]);
        cli.api_key = None;
        assert!(matches!(Settings::from_cli(&cli), Err(ConfigError::MissingApiKey)));

        cli.api_key = Some("   ".to_string());
        assert!(matches!(Settings::from_cli(&cli), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let cli = parse(&["--api-key", "k", "--cache-ttl-secs", "0", "get", "Oslo"]);
        assert!(matches!(Settings::from_cli(&cli), Err(ConfigError::InvalidTtl)));
    }

    #[test]
    fn test_ttl_above_maximum_is_rejected() {
        let max = MAX_CACHE_TTL_SECS.to_string();
        let cli = parse(&["--api-key", "k", "--cache-ttl-secs", &max, "get", "Oslo"]);
        let settings = Settings::from_cli(&cli).expect("Maximum TTL should be accepted");
        assert_eq!(settings.weather.cache_ttl, Duration::from_secs(MAX_CACHE_TTL_SECS));

        let over = (MAX_CACHE_TTL_SECS + 1).to_string();
        let cli = parse(&["--api-key", "k", "--cache-ttl-secs", &over, "get", "Oslo"]);
        assert!(matches!(Settings::from_cli(&cli), Err(ConfigError::InvalidTtl)));

        let huge = u64::MAX.to_string();
        let cli = parse(&["--api-key", "k", "--cache-ttl-secs", &huge, "get", "Oslo"]);
        assert!(matches!(Settings::from_cli(&cli), Err(ConfigError::InvalidTtl)));
    }

    #[test]
    fn test_zero_timeouts_are_rejected() {
        let cli = parse(&["--api-key", "k", "--cache-timeout-ms", "0", "get", "Oslo"]);
        assert!(matches!(
            Settings::from_cli(&cli),
            Err(ConfigError::InvalidTimeout("cache"))
        ));

        let cli = parse(&["--api-key", "k", "--origin-timeout-secs", "0", "get", "Oslo"]);
        assert!(matches!(
            Settings::from_cli(&cli),
            Err(ConfigError::InvalidTimeout("origin"))
        ));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        for raw in ["not a url", "ftp://example.com/", "mailto:someone@example.com"] {
            let cli = parse(&["--api-key", "k", "--base-url", raw, "get", "Oslo"]);
            assert!(
                matches!(Settings::from_cli(&cli), Err(ConfigError::InvalidBaseUrl(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_blank_redis_url_means_no_redis() {
        let cli = parse(&["--api-key", "k", "--redis-url", "", "get", "Oslo"]);
        let settings = Settings::from_cli(&cli).unwrap();
        assert!(settings.redis_url.is_none());
    }

    #[test]
    fn test_malformed_redis_url_is_a_config_error() {
        for raw in ["not a url", "http://localhost:6379", "redis://:secret@[::1"] {
            let cli = parse(&["--api-key", "k", "--redis-url", raw, "get", "Oslo"]);
            match Settings::from_cli(&cli) {
                Err(ConfigError::InvalidRedisUrl(msg)) => {
                    assert!(!msg.contains("secret"), "Password leaked: {msg}");
                }
                other => panic!("{raw} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["weather-cache", "serve"]).unwrap();
        match cli.command {
            Command::Serve { bind, port } => {
                assert_eq!(bind, "0.0.0.0");
                // PORT may be set in the environment running the tests.
                if std::env::var("PORT").is_err() {
                    assert_eq!(port, 3000);
                }
            }
            other => panic!("Expected serve, got {other:?}"),
        }
    }

    #[test]
    fn test_listen_addr() {
        assert_eq!(
            listen_addr("127.0.0.1", 8080).unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert!(matches!(
            listen_addr("not-an-ip", 80),
            Err(ConfigError::InvalidListenAddr(_))
        ));
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["weather-cache"]).is_err());
    }
}
