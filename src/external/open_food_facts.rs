// ABOUTME: Open Food Facts API client for barcode product lookups
// ABOUTME: Distinguishes not-found, timeout and transport failures and caches hits briefly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Open Food Facts client
//!
//! The public product database needs no key. Two endpoints are used:
//!
//! - `/api/v0/product/{code}.json` for the cached barcode lookup, with a short
//!   timeout so a slow upstream turns into a 504 instead of a hung request
//! - `/api/v2/product/{code}.json` for the journal's quick barcode prefill
//!
//! Successful v0 lookups are cached in memory for a few minutes.
//!
//! # API Reference
//! <https://openfoodfacts.github.io/openfoodfacts-server/api/>

use crate::constants::{defaults, limits, service};
use crate::errors::{AppError, AppResult};
use crate::models::Nutriments;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

const SERVICE: &str = "Open Food Facts";

/// Open Food Facts client configuration
#[derive(Debug, Clone)]
pub struct OpenFoodFactsConfig {
    /// Base URL (default: <https://world.openfoodfacts.org>)
    pub base_url: String,
    /// Per-request timeout in seconds (default: 8)
    pub timeout_secs: u64,
    /// How long a found product stays cached in memory
    pub cache_ttl_secs: u64,
}

impl Default for OpenFoodFactsConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPEN_FOOD_FACTS_BASE_URL.to_owned(),
            timeout_secs: defaults::OPEN_FOOD_FACTS_TIMEOUT_SECS,
            cache_ttl_secs: limits::PRODUCT_CACHE_TTL_SECS,
        }
    }
}

/// Product fields read from an Open Food Facts record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffProduct {
    pub product_name: Option<String>,
    pub brands: Option<String>,
    pub image_front_url: Option<String>,
    pub image_url: Option<String>,
    pub image_small_url: Option<String>,
    pub serving_size: Option<String>,
    pub nutriments: Nutriments,
}

impl OffProduct {
    /// Read the fields of a `product` object, ignoring anything malformed
    #[must_use]
    pub fn from_value(product: &Value) -> Self {
        let text = |key: &str| {
            product
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        let nutriments = match product.get("nutriments") {
            Some(Value::Object(map)) => Nutriments(map.clone()),
            _ => Nutriments::new(),
        };

        Self {
            product_name: text("product_name"),
            brands: text("brands"),
            image_front_url: text("image_front_url"),
            image_url: text("image_url"),
            image_small_url: text("image_small_url"),
            serving_size: text("serving_size"),
            nutriments,
        }
    }
}

/// Outcome of a v0 lookup
#[derive(Debug, Clone, PartialEq)]
pub enum OffLookup {
    Found(OffProduct),
    NotFound,
    TimedOut,
    Unavailable(String),
}

/// Remote product database
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Look a barcode up on the v0 endpoint
    async fn fetch_product_v0(&self, code: &str) -> OffLookup;

    /// Look a barcode up on the v2 endpoint, `None` when unknown
    ///
    /// # Errors
    ///
    /// Returns an external service error on transport failures
    async fn fetch_product_v2(&self, code: &str) -> AppResult<Option<OffProduct>>;
}

/// Cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

/// Open Food Facts HTTP client
pub struct OpenFoodFactsClient {
    config: OpenFoodFactsConfig,
    http_client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CacheEntry<OffProduct>>>>,
}

impl OpenFoodFactsClient {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: OpenFoodFactsConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!(
                "{}/{}",
                service::SERVICE_NAME,
                service::SERVICE_VERSION
            ))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn product_url(&self, version: &str, code: &str) -> String {
        format!(
            "{}/api/{version}/product/{code}.json",
            self.config.base_url.trim_end_matches('/')
        )
    }

    async fn cached(&self, code: &str) -> Option<OffProduct> {
        let cache = self.cache.read().await;
        cache
            .get(code)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.data.clone())
    }

    async fn remember(&self, code: &str, product: &OffProduct) {
        let mut cache = self.cache.write().await;
        let now = Instant::now();
        cache.retain(|_, entry| now < entry.expires_at);
        cache.insert(
            code.to_owned(),
            CacheEntry {
                data: product.clone(),
                expires_at: now + Duration::from_secs(self.config.cache_ttl_secs),
            },
        );
    }

    /// Clear the in-memory cache
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }
}

/// Extract the product from a `{status, product}` envelope
fn product_from_envelope(body: &Value) -> Option<OffProduct> {
    let status = body.get("status").and_then(Value::as_i64);
    envelope_product(body).filter(|_| status == Some(1))
}

/// v2 answers only count as missing on an explicit `status: 0`
fn product_from_v2_envelope(body: &Value) -> Option<OffProduct> {
    let status = body.get("status").and_then(Value::as_i64);
    envelope_product(body).filter(|_| status != Some(0))
}

fn envelope_product(body: &Value) -> Option<OffProduct> {
    match body.get("product") {
        Some(product @ Value::Object(_)) => Some(OffProduct::from_value(product)),
        _ => None,
    }
}

#[async_trait]
impl ProductCatalog for OpenFoodFactsClient {
    async fn fetch_product_v0(&self, code: &str) -> OffLookup {
        if let Some(product) = self.cached(code).await {
            debug!(code, "Open Food Facts cache hit");
            return OffLookup::Found(product);
        }

        let response = match self.http_client.get(self.product_url("v0", code)).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(code, "Open Food Facts lookup timed out");
                return OffLookup::TimedOut;
            }
            Err(e) => {
                warn!(code, error = %e, "Open Food Facts lookup failed");
                return OffLookup::Unavailable(e.to_string());
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return OffLookup::NotFound;
        }
        if !status.is_success() {
            return OffLookup::Unavailable(format!("HTTP {status}"));
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return OffLookup::TimedOut,
            Err(e) => return OffLookup::Unavailable(format!("JSON parse error: {e}")),
        };

        match product_from_envelope(&body) {
            Some(product) => {
                self.remember(code, &product).await;
                OffLookup::Found(product)
            }
            None => OffLookup::NotFound,
        }
    }

    async fn fetch_product_v2(&self, code: &str) -> AppResult<Option<OffProduct>> {
        let response = self
            .http_client
            .get(self.product_url("v2", code))
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE, e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::external_service(
                SERVICE,
                format!("HTTP {}", response.status()),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::external_service(SERVICE, format!("JSON parse error: {e}")))?;

        Ok(product_from_v2_envelope(&body))
    }
}

/// Scripted product behavior for [`MockProductCatalog`]
#[derive(Debug, Clone)]
enum MockBehavior {
    Product(OffProduct),
    TimedOut,
    Unavailable,
}

/// In-memory product catalog for tests (no API calls)
#[derive(Default)]
pub struct MockProductCatalog {
    behaviors: HashMap<String, MockBehavior>,
    calls: AtomicUsize,
}

impl MockProductCatalog {
    /// Empty catalog: every lookup is not found
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer lookups of `code` with a product
    #[must_use]
    pub fn with_product(mut self, code: &str, product: OffProduct) -> Self {
        self.behaviors
            .insert(code.to_owned(), MockBehavior::Product(product));
        self
    }

    /// Make lookups of `code` time out
    #[must_use]
    pub fn with_timeout(mut self, code: &str) -> Self {
        self.behaviors.insert(code.to_owned(), MockBehavior::TimedOut);
        self
    }

    /// Make lookups of `code` fail at the transport level
    #[must_use]
    pub fn with_unavailable(mut self, code: &str) -> Self {
        self.behaviors
            .insert(code.to_owned(), MockBehavior::Unavailable);
        self
    }

    /// Number of lookups made so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductCatalog for MockProductCatalog {
    async fn fetch_product_v0(&self, code: &str) -> OffLookup {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviors.get(code) {
            Some(MockBehavior::Product(product)) => OffLookup::Found(product.clone()),
            Some(MockBehavior::TimedOut) => OffLookup::TimedOut,
            Some(MockBehavior::Unavailable) => {
                OffLookup::Unavailable("connection refused".to_owned())
            }
            None => OffLookup::NotFound,
        }
    }

    async fn fetch_product_v2(&self, code: &str) -> AppResult<Option<OffProduct>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviors.get(code) {
            Some(MockBehavior::Product(product)) => Ok(Some(product.clone())),
            Some(MockBehavior::TimedOut | MockBehavior::Unavailable) => Err(
                AppError::external_service(SERVICE, "connection refused"),
            ),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_requires_status_one() {
        let found = json!({
            "status": 1,
            "product": {
                "product_name": " Teh Botol ",
                "brands": "",
                "image_front_url": "https://img.test/front.jpg",
                "nutriments": {"energy-kcal_100g": 40}
            }
        });
        let product = product_from_envelope(&found).unwrap();
        assert_eq!(product.product_name.as_deref(), Some("Teh Botol"));
        assert_eq!(product.brands, None);
        assert_eq!(product.nutriments.number("energy-kcal_100g"), Some(40.0));

        let missing = json!({"status": 0, "status_verbose": "product not found"});
        assert!(product_from_envelope(&missing).is_none());
    }

    #[test]
    fn test_v2_envelope_only_rejects_explicit_status_zero() {
        let product = json!({"product_name": "Indomie Goreng", "nutriments": {}});

        let without_status = json!({ "product": product });
        assert_eq!(
            product_from_v2_envelope(&without_status)
                .unwrap()
                .product_name
                .as_deref(),
            Some("Indomie Goreng")
        );
        assert!(product_from_envelope(&without_status).is_none());

        let not_found = json!({ "status": 0, "product": product });
        assert!(product_from_v2_envelope(&not_found).is_none());

        let no_product = json!({ "status": 1 });
        assert!(product_from_v2_envelope(&no_product).is_none());
    }

    #[test]
    fn test_product_url() {
        let client = OpenFoodFactsClient::new(OpenFoodFactsConfig {
            base_url: "http://localhost:9/".to_owned(),
            ..OpenFoodFactsConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.product_url("v0", "8991002101609"),
            "http://localhost:9/api/v0/product/8991002101609.json"
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let client = OpenFoodFactsClient::new(OpenFoodFactsConfig {
            base_url: "http://127.0.0.1:9".to_owned(),
            timeout_secs: 2,
            cache_ttl_secs: 60,
        })
        .unwrap();
        assert!(matches!(
            client.fetch_product_v0("8991002101609").await,
            OffLookup::Unavailable(_) | OffLookup::TimedOut
        ));
    }

    #[tokio::test]
    async fn test_mock_catalog_behaviors() {
        let catalog = MockProductCatalog::new()
            .with_product("11111111", OffProduct::default())
            .with_timeout("22222222");

        assert!(matches!(
            catalog.fetch_product_v0("11111111").await,
            OffLookup::Found(_)
        ));
        assert_eq!(catalog.fetch_product_v0("22222222").await, OffLookup::TimedOut);
        assert_eq!(catalog.fetch_product_v0("33333333").await, OffLookup::NotFound);
        assert_eq!(catalog.call_count(), 3);
    }
}
