//! Where the bot gets its match results from.

use crate::codes::types::MatchResult;
use crate::codes::{CodeResolver, ResolveError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::error;

/// Timeout for calls to a remote code API.
const REMOTE_TIMEOUT_SECS: u64 = 30;

/// Interface for code lookups used by the conversation session
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeSource: Send + Sync {
    /// Resolve free text.
    async fn by_message(&self, message: &str) -> Result<MatchResult, ResolveError>;
    /// Resolve coordinates.
    async fn by_location(&self, lat: f64, lon: f64) -> Result<MatchResult, ResolveError>;
}

#[async_trait]
impl CodeSource for CodeResolver {
    async fn by_message(&self, message: &str) -> Result<MatchResult, ResolveError> {
        CodeResolver::by_message(self, message).await
    }

    async fn by_location(&self, lat: f64, lon: f64) -> Result<MatchResult, ResolveError> {
        CodeResolver::by_location(self, lat, lon).await
    }
}

/// Client for a running `domofomka-api` instance.
pub struct ApiCodeSource {
    base_url: String,
    client: reqwest::Client,
}

impl ApiCodeSource {
    /// Create a client for the API rooted at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to build code API HTTP client, using defaults: {e}");
                reqwest::Client::new()
            }
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn fetch<Q: serde::Serialize + Sync + ?Sized>(
        &self,
        route: &str,
        query: &Q,
    ) -> Result<MatchResult, ResolveError> {
        let url = format!("{}{route}", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!("Code API request to {route} failed: {e}");
                ResolveError::Remote(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Code API error on {route}: {status}");
            return Err(ResolveError::Remote(format!("API returned status {status}")));
        }

        response.json::<MatchResult>().await.map_err(|e| {
            error!("Code API response from {route} could not be decoded: {e}");
            ResolveError::Remote(e.to_string())
        })
    }
}

#[async_trait]
impl CodeSource for ApiCodeSource {
    async fn by_message(&self, message: &str) -> Result<MatchResult, ResolveError> {
        self.fetch("/codes/msg", &[("message", message)]).await
    }

    async fn by_location(&self, lat: f64, lon: f64) -> Result<MatchResult, ResolveError> {
        self.fetch("/codes/geo", &[("lat", lat), ("lon", lon)]).await
    }
}
