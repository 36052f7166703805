//! HTTP front end
//!
//! Exposes the read-through client over a small JSON API:
//! `GET /weather?location=..`, `DELETE /weather?location=..` and `GET /health`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::{FetchError, WeatherClient, WeatherResponse};

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
        }
    }

    /// Bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "BAD_REQUEST")
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match &err {
            FetchError::InvalidLocation => ApiError::bad_request(err.to_string()),
            FetchError::OriginUnreachable(source) if source.is_timeout() => {
                ApiError::new(StatusCode::GATEWAY_TIMEOUT, err.to_string(), "ORIGIN_TIMEOUT")
            }
            FetchError::OriginUnreachable(_) => {
                ApiError::new(StatusCode::BAD_GATEWAY, err.to_string(), "ORIGIN_UNREACHABLE")
            }
            FetchError::OriginRejected(_) => {
                ApiError::new(StatusCode::BAD_GATEWAY, err.to_string(), "ORIGIN_REJECTED")
            }
            FetchError::DecodeFailed(_) => {
                ApiError::new(StatusCode::BAD_GATEWAY, err.to_string(), "ORIGIN_DECODE_FAILED")
            }
        }
    }
}

/// Query string for the weather routes
#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub location: Option<String>,
}

impl LocationQuery {
    fn require(self) -> Result<String, ApiError> {
        self.location
            .filter(|loc| !loc.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Location parameter is required"))
    }
}

/// Creates the API router with all routes configured.
pub fn create_router(client: Arc<WeatherClient>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/weather", get(get_weather).delete(evict_weather))
        .with_state(client)
}

/// Serves the API until Ctrl-C is received
pub async fn serve(client: Arc<WeatherClient>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "server listening");

    axum::serve(listener, create_router(client))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_weather(
    State(client): State<Arc<WeatherClient>>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let location = query.require()?;
    let weather = client.get_weather(&location).await?;
    Ok(Json(weather))
}

async fn evict_weather(
    State(client): State<Arc<WeatherClient>>,
    Query(query): Query<LocationQuery>,
) -> Result<StatusCode, ApiError> {
    let location = query.require()?;
    client.invalidate(&location).await.map_err(|err| {
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string(), "CACHE_UNAVAILABLE")
    })?;
    Ok(StatusCode::NO_CONTENT)
}
