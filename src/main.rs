//! weather-cache - Serve weather lookups through a Redis read-through cache
//!
//! Loads configuration from the command line, the environment and an
//! optional `.env` file, then runs the HTTP server or a one-off command.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use weather_cache::cache::{Cache, CacheBackend, MemoryBackend, RedisBackend};
use weather_cache::cli::{listen_addr, Cli, Command, Settings};
use weather_cache::data::WeatherClient;
use weather_cache::server;

/// Picks the cache backend: Redis when a URL is configured, otherwise in-process
fn build_backend(settings: &Settings) -> Result<Arc<dyn CacheBackend>, Box<dyn std::error::Error>> {
    match &settings.redis_url {
        Some(url) => Ok(Arc::new(RedisBackend::open(url)?)),
        None => {
            warn!("REDIS_URL not set, using an in-process cache");
            Ok(Arc::new(MemoryBackend::new()))
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_cli(&cli)?;

    let cache = Cache::new(build_backend(&settings)?).with_timeout(settings.cache_timeout);
    info!(
        backend = cache.backend_name(),
        ttl_secs = settings.weather.cache_ttl.as_secs(),
        "cache configured"
    );
    let client = WeatherClient::new(settings.weather.clone(), cache)?;

    match cli.command {
        Command::Serve { bind, port } => {
            let addr = listen_addr(&bind, port)?;
            server::serve(Arc::new(client), addr).await?;
        }
        Command::Get { location } => {
            let weather = client.get_weather(&location).await?;
            println!("{}", serde_json::to_string_pretty(&weather)?);
        }
        Command::Evict { location } => {
            client.invalidate(&location).await?;
            println!("Evicted cached weather for '{}'", location);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "weather_cache=debug,info"
    } else {
        "weather_cache=info,warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
