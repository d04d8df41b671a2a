//! Reverse geocoding: coordinates to a single address line.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Default Dadata suggestions API root.
pub const DADATA_DEFAULT_URL: &str = "https://suggestions.dadata.ru/suggestions/api/4_1/rs";

/// Request timeout for geocoding calls.
pub const GEOCODING_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur during geocoding
#[derive(Error, Debug)]
pub enum GeocodingError {
    /// Transport or decoding failure
    #[error("Geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Interface for reverse geocoders
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best-guess address line for the coordinates, if any.
    async fn address_by_location(&self, lat: f64, lon: f64)
        -> Result<Option<String>, GeocodingError>;
}

#[derive(Debug, Deserialize)]
struct GeolocateResponse {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    #[serde(default)]
    data: HouseData,
}

#[derive(Debug, Default, Deserialize)]
struct HouseData {
    city: Option<String>,
    street: Option<String>,
    house: Option<String>,
    block_type: Option<String>,
    block: Option<String>,
}

impl HouseData {
    /// `"{city} {street} {house}"` plus an optional block suffix.
    fn address_line(&self) -> Option<String> {
        let street = self.street.as_deref().filter(|s| !s.is_empty())?;
        let mut address = format!(
            "{} {} {}",
            self.city.as_deref().unwrap_or_default(),
            street,
            self.house.as_deref().unwrap_or_default()
        );

        if let Some(block) = self.block.as_deref().filter(|b| !b.is_empty()) {
            let block_type = self
                .block_type
                .as_deref()
                .unwrap_or_default()
                .replace("стр", "с");
            let block = block.replace(" стр ", "с");
            address.push_str(&format!(" {block_type}{block}"));
        }

        Some(address.trim().to_string())
    }
}

/// Dadata reverse-geocoding client.
pub struct DadataClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl DadataClient {
    /// Create a client against the public Dadata endpoint.
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self::with_base_url(DADATA_DEFAULT_URL, token)
    }

    /// Create a client against a custom API root.
    #[must_use]
    pub fn with_base_url(base_url: &str, token: &str) -> Self {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(GEOCODING_TIMEOUT_SECS))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to build geocoding HTTP client, using defaults: {e}");
                reqwest::Client::new()
            }
        };

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        }
    }
}

#[async_trait]
impl Geocoder for DadataClient {
    async fn address_by_location(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Option<String>, GeocodingError> {
        let url = format!("{}/geolocate/address", self.base_url);
        debug!(lat, lon, "Dadata geolocate request");

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "lat": lat, "lon": lon }))
            .send()
            .await
            .map_err(|e| {
                error!("Dadata request failed: {e}");
                GeocodingError::Request(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Dadata API error: {status}");
            return Ok(None);
        }

        let body: GeolocateResponse = response.json().await.map_err(|e| {
            error!("Dadata response could not be decoded: {e}");
            GeocodingError::Request(e)
        })?;

        Ok(body
            .suggestions
            .first()
            .and_then(|suggestion| suggestion.data.address_line()))
    }
}
