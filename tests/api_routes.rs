//! Router tests against in-memory collaborators.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domofomka::api::{build_router, VersionInfo};
use domofomka::codes::types::AddressRecord;
use domofomka::codes::CodeResolver;
use domofomka::geocoding::{Geocoder, GeocodingError};
use domofomka::storage::address::{AddressStore, InMemoryAddressStore, RowPredicate, StoreError};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct FixedGeocoder(Option<&'static str>);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn address_by_location(
        &self,
        _lat: f64,
        _lon: f64,
    ) -> Result<Option<String>, GeocodingError> {
        Ok(self.0.map(str::to_string))
    }
}

struct BrokenStore;

#[async_trait]
impl AddressStore for BrokenStore {
    async fn scan(&self, _predicate: &RowPredicate<'_>) -> Result<Vec<AddressRecord>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }
}

fn record(id: i64, entrance: &str, code_type: &str, code: &str) -> AddressRecord {
    AddressRecord {
        id,
        city: "москва".to_string(),
        street: "ленина".to_string(),
        street_type: "улица".to_string(),
        house: "5".to_string(),
        entrance: entrance.to_string(),
        code_type: code_type.to_string(),
        code: code.to_string(),
    }
}

fn app(geocoded: Option<&'static str>) -> axum::Router {
    let store = InMemoryAddressStore::new(vec![
        record(1, "2", "yaeda", "2к4461"),
        record(2, "1", "delivery", "#1234"),
        record(3, "2", "oldcodes", "0000"),
    ]);
    let resolver = CodeResolver::new(Arc::new(store), Some(Arc::new(FixedGeocoder(geocoded))));
    build_router(Arc::new(resolver))
}

fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b == b'.' || b == b'-' {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect()
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

#[tokio::test]
async fn message_lookup_returns_codes_by_entrance() {
    let uri = format!("/codes/msg?message={}", encode("Ленина, дом 5"));
    let (status, body) = get(app(None), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "address": "москва, улица ленина, дом 5",
            "data": {
                "2": [["2к4461", "yaeda"], ["0000", "oldcodes"]],
                "1": [["#1234", "delivery"]]
            }
        })
    );
}

#[tokio::test]
async fn entrance_order_follows_the_store() {
    let uri = format!("/codes/msg?message={}", encode("ленина 5"));
    let response = app(None)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");

    let second = text.find("\"2\"").expect("entrance 2");
    let first = text.find("\"1\"").expect("entrance 1");
    assert!(second < first, "{text}");
}

#[tokio::test]
async fn unknown_address_is_an_empty_object() {
    let uri = format!("/codes/msg?message={}", encode("мира 10"));
    let (status, body) = get(app(None), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn missing_message_is_a_bad_request() {
    let (status, _) = get(app(None), "/codes/msg").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn location_lookup_uses_geocoded_address() {
    let (status, body) = get(app(Some("Москва Ленина 5")), "/codes/geo?lat=55.75&lon=37.61").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], "москва, улица ленина, дом 5");
}

#[tokio::test]
async fn ungeocodable_location_is_an_empty_object() {
    let (status, body) = get(app(None), "/codes/geo?lat=0&lon=0").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn malformed_coordinates_are_a_bad_request() {
    let (status, _) = get(app(None), "/codes/geo?lat=north&lon=37.61").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_failure_is_a_server_error() {
    let resolver = CodeResolver::new(Arc::new(BrokenStore), None);
    let uri = format!("/codes/msg?message={}", encode("ленина 5"));
    let (status, body) = get(build_router(Arc::new(resolver)), &uri).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn version_reports_package_metadata() {
    let (status, body) = get(app(None), "/version").await;

    assert_eq!(status, StatusCode::OK);
    let info: VersionInfo = serde_json::from_value(body).expect("version info");
    assert_eq!(info.name, "domofomka");
    assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
}
