//! HTTP API: code lookups by message or coordinates, plus build metadata.

use crate::codes::types::MatchResult;
use crate::codes::{CodeResolver, ResolveError};
use crate::config::ApiSettings;
use crate::geocoding::DadataClient;
use crate::storage::address::SqliteAddressStore;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Errors returned by API handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "API error");
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Query of `GET /codes/msg`.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    /// Free-text address.
    pub message: String,
}

/// Query of `GET /codes/geo`.
#[derive(Debug, Deserialize)]
pub struct GeoQuery {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// Body of `GET /version`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionInfo {
    /// Package name.
    pub name: String,
    /// Package version.
    pub version: String,
    /// Package description.
    pub description: String,
}

impl VersionInfo {
    /// Metadata of this build.
    #[must_use]
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: env!("CARGO_PKG_DESCRIPTION").to_string(),
        }
    }
}

async fn codes_by_message(
    State(resolver): State<Arc<CodeResolver>>,
    Query(query): Query<MessageQuery>,
) -> Result<Json<MatchResult>, ApiError> {
    Ok(Json(resolver.by_message(&query.message).await?))
}

async fn codes_by_location(
    State(resolver): State<Arc<CodeResolver>>,
    Query(query): Query<GeoQuery>,
) -> Result<Json<MatchResult>, ApiError> {
    Ok(Json(resolver.by_location(query.lat, query.lon).await?))
}

async fn version() -> Json<VersionInfo> {
    Json(VersionInfo::current())
}

/// Build the router with request tracing.
pub fn build_router(resolver: Arc<CodeResolver>) -> Router {
    Router::new()
        .route("/codes/msg", get(codes_by_message))
        .route("/codes/geo", get(codes_by_location))
        .route("/version", get(version))
        .layer(TraceLayer::new_for_http())
        .with_state(resolver)
}

/// Serve the API until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the address cannot
/// be bound.
pub async fn serve(settings: ApiSettings) -> anyhow::Result<()> {
    let store = SqliteAddressStore::connect(&settings.db_name).await?;
    let geocoder = DadataClient::with_base_url(&settings.dadata_url, &settings.dadata_token);
    let resolver = Arc::new(CodeResolver::new(
        Arc::new(store),
        Some(Arc::new(geocoder)),
    ));

    let bind_address = settings.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;
    info!("API listening on {bind_address}");

    axum::serve(listener, build_router(resolver))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
