//! Address resolution: from a raw message or coordinates to entrance codes.
//!
//! Pipeline: [`candidate::select_token`] narrows the store scan, the store
//! applies [`candidate::street_or_city_contains`] and [`matcher::matches`]
//! per row, and [`aggregate::aggregate`] folds the survivors.

/// Folding matched rows into a result.
pub mod aggregate;
/// Scan pre-filter token selection.
pub mod candidate;
/// Exact per-record matcher.
pub mod matcher;
/// Text normalization.
pub mod normalizer;
/// Records and results.
pub mod types;

use crate::geocoding::{Geocoder, GeocodingError};
use crate::storage::address::{AddressStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use types::{AddressRecord, MatchResult};

/// Errors that can occur while resolving an address
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Address store failure
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Geocoder failure
    #[error(transparent)]
    Geocoding(#[from] GeocodingError),
    /// Coordinates given but no geocoder configured
    #[error("Geocoding is not configured")]
    GeocoderUnavailable,
    /// Remote resolution service failure
    #[error("Remote resolver error: {0}")]
    Remote(String),
}

/// Resolves messages and coordinates against an address store.
pub struct CodeResolver {
    store: Arc<dyn AddressStore>,
    geocoder: Option<Arc<dyn Geocoder>>,
}

impl CodeResolver {
    /// Create a resolver; without a geocoder only text queries work.
    #[must_use]
    pub fn new(store: Arc<dyn AddressStore>, geocoder: Option<Arc<dyn Geocoder>>) -> Self {
        Self { store, geocoder }
    }

    /// Resolve a free-text address.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::Store` if the scan fails.
    pub async fn by_message(&self, message: &str) -> Result<MatchResult, ResolveError> {
        if message.is_empty() {
            return Ok(MatchResult::default());
        }

        let Some(token) = candidate::select_token(message) else {
            debug!("No filter token in message, skipping scan");
            return Ok(MatchResult::default());
        };

        let predicate = |record: &AddressRecord| {
            candidate::street_or_city_contains(&token, &record.city, &record.street)
                && matcher::matches(
                    message,
                    &record.city,
                    &record.street,
                    &record.house,
                    &record.street_type,
                )
        };
        let records = self.store.scan(&predicate).await?;
        let result = aggregate::aggregate(&records);

        info!(
            token = %token,
            matched = records.len(),
            entrances = result.data.len(),
            "Resolved message"
        );
        Ok(result)
    }

    /// Resolve coordinates through the geocoder, then as text.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::GeocoderUnavailable` without a geocoder, or the
    /// geocoder/store error.
    pub async fn by_location(&self, lat: f64, lon: f64) -> Result<MatchResult, ResolveError> {
        let geocoder = self
            .geocoder
            .as_ref()
            .ok_or(ResolveError::GeocoderUnavailable)?;

        match geocoder.address_by_location(lat, lon).await? {
            Some(address) => {
                debug!(%address, "Geocoded location");
                self.by_message(&address).await
            }
            None => Ok(MatchResult::default()),
        }
    }
}
