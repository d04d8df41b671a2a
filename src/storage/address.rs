//! Address record store.
//!
//! The store evaluates a caller-supplied predicate per row during a full
//! scan; there is no index lookup.

use crate::codes::types::AddressRecord;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors that can occur while scanning the address store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Query or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Per-row predicate evaluated while scanning.
pub type RowPredicate<'a> = dyn Fn(&AddressRecord) -> bool + Send + Sync + 'a;

/// Interface for address record stores
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Return every record accepted by `predicate`, in store row order.
    async fn scan(&self, predicate: &RowPredicate<'_>) -> Result<Vec<AddressRecord>, StoreError>;
}

const SCAN_QUERY: &str = r"
    SELECT id, city, street_type, street,
           CAST(house AS TEXT) AS house,
           CAST(entrance AS TEXT) AS entrance,
           code_type,
           CAST(code AS TEXT) AS code
    FROM codes
";

/// SQLite-backed store reading the `codes` table.
#[derive(Clone)]
pub struct SqliteAddressStore {
    pool: SqlitePool,
}

impl SqliteAddressStore {
    /// Open the database file read-only.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the file cannot be opened.
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new().filename(path).read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to open address database {path}: {e}");
                StoreError::Database(e)
            })?;
        info!("Address database opened: {path}");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &SqliteRow) -> Result<AddressRecord, sqlx::Error> {
    Ok(AddressRecord {
        id: row.try_get("id")?,
        city: row.try_get("city")?,
        street: row.try_get("street")?,
        street_type: row.try_get("street_type")?,
        house: row.try_get("house")?,
        entrance: row.try_get("entrance")?,
        code_type: row.try_get("code_type")?,
        code: row.try_get("code")?,
    })
}

fn scan_failed(e: sqlx::Error) -> StoreError {
    error!("Address scan failed: {e}");
    StoreError::Database(e)
}

#[async_trait]
impl AddressStore for SqliteAddressStore {
    async fn scan(&self, predicate: &RowPredicate<'_>) -> Result<Vec<AddressRecord>, StoreError> {
        let mut rows = sqlx::query(SCAN_QUERY).fetch(&self.pool);
        let mut matched = Vec::new();
        let mut scanned = 0_usize;

        while let Some(row) = rows.try_next().await.map_err(scan_failed)? {
            scanned += 1;
            let record = record_from_row(&row).map_err(scan_failed)?;
            if predicate(&record) {
                matched.push(record);
            }
        }

        debug!(scanned, matched = matched.len(), "Address scan finished");
        Ok(matched)
    }
}

/// Store holding records in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAddressStore {
    records: Vec<AddressRecord>,
}

impl InMemoryAddressStore {
    /// Create a store over the given records.
    #[must_use]
    pub fn new(records: Vec<AddressRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl AddressStore for InMemoryAddressStore {
    async fn scan(&self, predicate: &RowPredicate<'_>) -> Result<Vec<AddressRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect())
    }
}
