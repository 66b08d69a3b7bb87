// ABOUTME: Barcode resolution through the local product cache and Open Food Facts
// ABOUTME: Stores usable remote products and opens manual-entry requests for the rest
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Product lookup
//!
//! 1. The local `products` table is checked first.
//! 2. On a miss the v0 Open Food Facts endpoint is queried.
//! 3. A product with at least one of calories, protein, carbohydrates or fat
//!    above zero is stored with source `open_food_facts`.
//! 4. Unknown barcodes and products without usable nutrition open (or bump) a
//!    product request so administrators can add the product by hand.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::constants::{messages, product_sources};
use crate::database::Database;
use crate::errors::AppResult;
use crate::external::{OffLookup, OffProduct, ProductCatalog};
use crate::logging::AppLogger;
use crate::models::{Nutriments, Product, Requester};
use crate::services::product_requests::record_request;

/// Calorie keys in order of preference
const CALORIE_KEYS: &[&str] = &["energy-kcal", "energy-kcal_100g"];
const PROTEIN_KEYS: &[&str] = &["proteins_100g", "proteins"];
const CARB_KEYS: &[&str] = &["carbohydrates_100g", "carbohydrates"];
const FAT_KEYS: &[&str] = &["fat_100g", "fat"];
const SUGAR_KEYS: &[&str] = &["sugars_100g", "sugars"];
const SODIUM_KEYS: &[&str] = &["sodium_100g", "sodium"];

/// Result of resolving a barcode
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Served from the local cache
    Cached(Product),
    /// Fetched from Open Food Facts and stored
    Fetched(Product),
    /// Unknown everywhere; a product request was recorded
    NotFound,
    /// Known remotely but without usable nutrition; a product request was recorded
    IncompleteNutrition {
        /// Name reported by Open Food Facts
        product_name: String,
    },
    /// Open Food Facts did not answer in time
    TimedOut,
    /// Open Food Facts could not be reached
    Unavailable,
}

/// Cache-then-remote barcode resolution
#[derive(Clone)]
pub struct ProductLookupService {
    database: Arc<Database>,
    catalog: Arc<dyn ProductCatalog>,
}

impl ProductLookupService {
    /// Create a lookup service
    #[must_use]
    pub fn new(database: Arc<Database>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { database, catalog }
    }

    /// Resolve a normalized barcode on behalf of `requester`
    ///
    /// # Errors
    ///
    /// Returns an error if the local cache cannot be read
    pub async fn lookup(&self, code: &str, requester: &Requester) -> AppResult<LookupOutcome> {
        if let Some(product) = self.database.get_product(code).await? {
            info!(code = %code, source = %product.source, "Product served from local cache");
            return Ok(LookupOutcome::Cached(product));
        }

        let started = Instant::now();
        let remote = self.catalog.fetch_product_v0(code).await;
        AppLogger::log_external_call(
            "open_food_facts",
            "product_v0",
            !matches!(remote, OffLookup::TimedOut | OffLookup::Unavailable(_)),
            elapsed_ms(started),
        );

        match remote {
            OffLookup::Found(remote) => Ok(self.store_remote(code, remote, requester).await),
            OffLookup::NotFound => {
                info!(code = %code, "Product unknown to Open Food Facts");
                record_request(&self.database, code, requester).await;
                Ok(LookupOutcome::NotFound)
            }
            OffLookup::TimedOut => Ok(LookupOutcome::TimedOut),
            OffLookup::Unavailable(reason) => {
                warn!(code = %code, "Open Food Facts unavailable: {reason}");
                Ok(LookupOutcome::Unavailable)
            }
        }
    }

    async fn store_remote(
        &self,
        code: &str,
        remote: OffProduct,
        requester: &Requester,
    ) -> LookupOutcome {
        let Some(product) = product_from_remote(code, &remote, Utc::now()) else {
            info!(code = %code, "Open Food Facts product has no usable nutrition data");
            record_request(&self.database, code, requester).await;
            return LookupOutcome::IncompleteNutrition {
                product_name: remote
                    .product_name
                    .unwrap_or_else(|| messages::NAME_UNAVAILABLE.to_owned()),
            };
        };

        // A concurrent lookup may have stored the same barcode first
        if let Err(e) = self.database.create_product(&product).await {
            warn!(code = %code, "Failed to cache Open Food Facts product: {e}");
        } else {
            info!(code = %code, "Cached product from Open Food Facts");
        }
        LookupOutcome::Fetched(product)
    }
}

/// Map an Open Food Facts record to a cached product
///
/// Returns `None` when none of calories, protein, carbohydrates or fat is
/// above zero.
#[must_use]
pub fn product_from_remote(
    code: &str,
    remote: &OffProduct,
    now: DateTime<Utc>,
) -> Option<Product> {
    let source = &remote.nutriments;
    let pick = |keys: &[&str]| source.first_non_zero(keys).unwrap_or(0.0);

    let calories = pick(CALORIE_KEYS);
    let protein = pick(PROTEIN_KEYS);
    let carbs = pick(CARB_KEYS);
    let fat = pick(FAT_KEYS);

    if [calories, protein, carbs, fat].iter().all(|v| *v <= 0.0) {
        return None;
    }

    let mut nutriments = Nutriments::new();
    nutriments.set("calories", calories);
    nutriments.set("proteins", protein);
    nutriments.set("carbs", carbs);
    nutriments.set("fat", fat);
    nutriments.set("sugar", pick(SUGAR_KEYS));
    nutriments.set("sodium", pick(SODIUM_KEYS));

    Some(Product {
        code: code.to_owned(),
        product_name: remote
            .product_name
            .clone()
            .unwrap_or_else(|| messages::UNNAMED_PRODUCT.to_owned()),
        brands: Some(
            remote
                .brands
                .clone()
                .unwrap_or_else(|| messages::UNKNOWN_BRAND.to_owned()),
        ),
        image_url: remote
            .image_front_url
            .clone()
            .or_else(|| remote.image_url.clone()),
        image_small_url: remote.image_small_url.clone(),
        serving_size: remote.serving_size.clone(),
        nutriments,
        source: product_sources::OPEN_FOOD_FACTS.to_owned(),
        created_at: now,
        last_updated: now,
    })
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
