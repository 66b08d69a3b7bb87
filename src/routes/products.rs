// ABOUTME: Barcode product route handlers for scanning and administrator catalog edits
// ABOUTME: Maps product lookup outcomes to the status codes and bodies the scanner screen expects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Product routes
//!
//! `GET /api/products/:code` resolves a barcode through
//! [`ProductLookupService`](crate::services::ProductLookupService). Catalog
//! edits require an administrator.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{json_response, lenient_number, msg_response, non_empty_string};
use crate::constants::{defaults, messages, product_sources};
use crate::errors::AppError;
use crate::middleware::{authenticate, require_admin};
use crate::models::{Nutriments, Product, RequestStatus, Requester};
use crate::nutrition::barcode;
use crate::server::ServerResources;
use crate::services::LookupOutcome;

/// Administrator product form, shared by create and update
#[derive(Debug, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default, deserialize_with = "non_empty_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub brands: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub calories: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub proteins: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub carbs: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sugar: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sodium: Option<f64>,
}

impl ProductForm {
    /// Nutriments in the flat shape administrators enter them
    fn nutriments(&self) -> Nutriments {
        let mut nutriments = Nutriments::new();
        nutriments.set("calories", self.calories.unwrap_or(0.0));
        nutriments.set("proteins", self.proteins.unwrap_or(0.0));
        nutriments.set("carbs", self.carbs.unwrap_or(0.0));
        nutriments.set("fat", self.fat.unwrap_or(0.0));
        nutriments.set("sugar", self.sugar.unwrap_or(0.0));
        nutriments.set("sodium", self.sodium.unwrap_or(0.0));
        nutriments
    }
}

/// Fields changed by `PUT /api/products/:code`
#[derive(Debug, Serialize)]
pub struct ProductUpdate {
    pub product_name: Option<String>,
    pub brands: Option<String>,
    pub nutriments: Nutriments,
    pub last_updated: DateTime<Utc>,
}

/// Product routes
pub struct ProductRoutes;

impl ProductRoutes {
    /// Create all product routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/products", post(Self::handle_create))
            .route(
                "/api/products/:code",
                get(Self::handle_lookup)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/products/:code
    async fn handle_lookup(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(code): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let code = barcode::validate_lookup_code(&code)?;

        let requester = Requester::new(auth.user_id, auth.name.as_deref(), auth.email.as_deref());
        let outcome = resources.lookup_service().lookup(&code, &requester).await?;

        Ok(Self::lookup_response(outcome))
    }

    fn lookup_response(outcome: LookupOutcome) -> Response {
        match outcome {
            LookupOutcome::Cached(product) => json_response(
                StatusCode::OK,
                json!({
                    "code": product.code,
                    "product_name": product.product_name,
                    "brands": product.brands,
                    "image_url": product.image_url.unwrap_or_default(),
                    "nutriments": product.nutriments,
                    "source": product.source,
                    "cached": true
                }),
            ),
            LookupOutcome::Fetched(product) => {
                let mut body = serde_json::to_value(&product).unwrap_or_else(|_| json!({}));
                if let Value::Object(map) = &mut body {
                    map.insert("cached".to_owned(), Value::Bool(false));
                }
                json_response(StatusCode::OK, body)
            }
            LookupOutcome::NotFound => json_response(
                StatusCode::NOT_FOUND,
                json!({
                    "msg": messages::PRODUCT_NOT_FOUND_ANYWHERE,
                    "suggestion": messages::SUGGEST_MANUAL_INPUT
                }),
            ),
            LookupOutcome::IncompleteNutrition { product_name } => json_response(
                StatusCode::NOT_FOUND,
                json!({
                    "msg": messages::PRODUCT_INCOMPLETE,
                    "suggestion": messages::SUGGEST_COMPLETE_NUTRITION,
                    "productName": product_name
                }),
            ),
            LookupOutcome::TimedOut => json_response(
                StatusCode::GATEWAY_TIMEOUT,
                json!({
                    "msg": messages::UPSTREAM_TIMEOUT,
                    "suggestion": messages::SUGGEST_RETRY
                }),
            ),
            LookupOutcome::Unavailable => json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "msg": messages::UPSTREAM_FAILED,
                    "suggestion": messages::SUGGEST_RETRY
                }),
            ),
        }
    }

    /// Handle POST /api/products - administrator adds a product by hand
    ///
    /// Pending product requests for the barcode are marked completed.
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(form): Json<ProductForm>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let admin = require_admin(&auth, &resources.database).await?;

        let (Some(raw_code), Some(product_name)) = (form.code.as_deref(), form.product_name.clone())
        else {
            return Ok(msg_response(
                StatusCode::BAD_REQUEST,
                messages::PRODUCT_FIELDS_REQUIRED,
            ));
        };
        let code = barcode::normalize(raw_code);

        if resources.database.get_product(&code).await?.is_some() {
            return Ok(msg_response(StatusCode::BAD_REQUEST, messages::PRODUCT_EXISTS));
        }

        let mut nutriments = form.nutriments();
        nutriments.set("sodium_100g", form.sodium.unwrap_or(0.0));

        let now = Utc::now();
        let product = Product {
            code: code.clone(),
            product_name,
            brands: Some(
                form.brands
                    .clone()
                    .unwrap_or_else(|| messages::UNKNOWN_BRAND.to_owned()),
            ),
            image_url: Some(
                form.image_url
                    .as_deref()
                    .map(str::trim)
                    .map_or_else(|| defaults::PLACEHOLDER_IMAGE_URL.to_owned(), str::to_owned),
            ),
            image_small_url: None,
            serving_size: None,
            nutriments,
            source: product_sources::LOCAL_ADMIN_INPUT.to_owned(),
            created_at: now,
            last_updated: now,
        };
        resources.database.create_product(&product).await?;
        info!(code = %code, admin = %admin.email, "Product added by administrator");

        match resources
            .database
            .resolve_pending_product_requests(
                &code,
                RequestStatus::Completed,
                messages::NOTE_PRODUCT_ADDED,
                admin.id,
                now,
            )
            .await
        {
            Ok(0) => {}
            Ok(resolved) => info!(code = %code, resolved, "Auto-resolved product requests"),
            Err(e) => warn!(code = %code, "Failed to auto-resolve product requests: {e}"),
        }

        Ok(json_response(
            StatusCode::OK,
            json!({ "msg": messages::PRODUCT_SAVED, "product": product }),
        ))
    }

    /// Handle PUT /api/products/:code
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(code): Path<String>,
        Json(form): Json<ProductForm>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        require_admin(&auth, &resources.database).await?;
        let code = barcode::normalize(&code);

        let Some(existing) = resources.database.get_product(&code).await? else {
            return Ok(msg_response(StatusCode::NOT_FOUND, messages::PRODUCT_NOT_FOUND));
        };

        let update = ProductUpdate {
            product_name: form.product_name.clone(),
            brands: form.brands.clone(),
            nutriments: form.nutriments(),
            last_updated: Utc::now(),
        };
        let name = update
            .product_name
            .as_deref()
            .unwrap_or(&existing.product_name);

        let updated = resources
            .database
            .update_product(
                &code,
                name,
                update.brands.as_deref(),
                &update.nutriments,
                update.last_updated,
            )
            .await?;
        if !updated {
            return Ok(msg_response(StatusCode::NOT_FOUND, messages::PRODUCT_NOT_FOUND));
        }

        info!(code = %code, "Product updated by administrator");
        Ok(json_response(
            StatusCode::OK,
            json!({ "msg": messages::PRODUCT_UPDATED, "product": update }),
        ))
    }

    /// Handle DELETE /api/products/:code
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(code): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        require_admin(&auth, &resources.database).await?;
        let code = barcode::normalize(&code);

        if !resources.database.delete_product(&code).await? {
            return Ok(msg_response(StatusCode::NOT_FOUND, messages::PRODUCT_NOT_FOUND));
        }

        info!(code = %code, "Product deleted by administrator");
        Ok(msg_response(StatusCode::OK, messages::PRODUCT_DELETED))
    }
}
