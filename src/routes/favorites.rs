// ABOUTME: Favorite product route handlers for toggling, listing and checking bookmarks
// ABOUTME: Creates the product from client data when a favorited barcode is not cached yet
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::{json_response, non_empty_string};
use crate::constants::{messages, product_sources};
use crate::errors::AppError;
use crate::middleware::authenticate;
use crate::models::{Favorite, Nutriments, Product};
use crate::server::ServerResources;

/// `POST /api/favorites` body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteRequest {
    #[serde(default, deserialize_with = "non_empty_string")]
    pub product_code: Option<String>,
    #[serde(default)]
    pub product_data: Option<ProductData>,
}

/// Product details the client sends along with a favorite
#[derive(Debug, Default, Deserialize)]
pub struct ProductData {
    #[serde(default, alias = "productName", deserialize_with = "non_empty_string")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub brands: Option<String>,
    #[serde(default, alias = "imageUrl", deserialize_with = "non_empty_string")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub image_small_url: Option<String>,
    #[serde(default)]
    pub nutriments: Option<Nutriments>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub serving_size: Option<String>,
}

impl ProductData {
    fn into_product(self, code: &str, now: DateTime<Utc>) -> Product {
        Product {
            code: code.to_owned(),
            product_name: self
                .product_name
                .unwrap_or_else(|| messages::UNNAMED_PRODUCT.to_owned()),
            brands: self.brands,
            image_url: self.image_url,
            image_small_url: self.image_small_url,
            serving_size: self.serving_size,
            nutriments: self.nutriments.unwrap_or_default(),
            source: product_sources::USER_FAVORITE.to_owned(),
            created_at: now,
            last_updated: now,
        }
    }
}

/// One favorite joined with its product
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteWithProduct {
    pub id: Uuid,
    pub product_code: String,
    pub added_at: DateTime<Utc>,
    pub product: Value,
}

/// Favorite product routes
pub struct FavoriteRoutes;

impl FavoriteRoutes {
    /// Create all favorite routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/favorites",
                post(Self::handle_toggle).get(Self::handle_list),
            )
            .route(
                "/api/favorites/check/:product_code",
                get(Self::handle_check),
            )
            .with_state(resources)
    }

    /// Handle POST /api/favorites - add the product when absent, remove it otherwise
    async fn handle_toggle(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ToggleFavoriteRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;

        let Some(product_code) = request.product_code else {
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": messages::PRODUCT_CODE_REQUIRED }),
            ));
        };

        let database = &resources.database;
        if database.get_product(&product_code).await?.is_none() {
            let Some(data) = request.product_data else {
                return Ok(json_response(
                    StatusCode::NOT_FOUND,
                    json!({ "error": messages::FAVORITE_PRODUCT_MISSING }),
                ));
            };
            if database
                .create_product_if_absent(&data.into_product(&product_code, Utc::now()))
                .await?
            {
                info!(code = %product_code, "Product created from favorite data");
            }
        }

        let is_favorited = database
            .toggle_favorite(&Favorite {
                id: Uuid::new_v4(),
                user_id: auth.user_id,
                product_code: product_code.clone(),
                added_at: Utc::now(),
            })
            .await?;
        let message = if is_favorited {
            messages::FAVORITE_ADDED
        } else {
            messages::FAVORITE_REMOVED
        };

        info!(user_id = %auth.user_id, code = %product_code, is_favorited, "Favorite toggled");
        Ok(json_response(
            StatusCode::OK,
            json!({
                "success": true,
                "isFavorited": is_favorited,
                "message": message
            }),
        ))
    }

    /// Handle GET /api/favorites - newest first, each with its product
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;

        let favorites = resources.database.list_favorites(auth.user_id).await?;
        let codes: Vec<String> = favorites.iter().map(|f| f.product_code.clone()).collect();
        let products: HashMap<String, Product> = resources
            .database
            .get_products(&codes)
            .await?
            .into_iter()
            .map(|product| (product.code.clone(), product))
            .collect();

        let mut joined = Vec::with_capacity(favorites.len());
        for favorite in favorites {
            let product = match products.get(&favorite.product_code) {
                Some(product) => Self::product_with_normalized_nutriments(product)?,
                None => json!({ "code": favorite.product_code, "nutriments": {} }),
            };
            joined.push(FavoriteWithProduct {
                id: favorite.id,
                product_code: favorite.product_code,
                added_at: favorite.added_at,
                product,
            });
        }

        Ok(Json(json!({ "success": true, "favorites": joined })).into_response())
    }

    fn product_with_normalized_nutriments(product: &Product) -> Result<Value, AppError> {
        let mut product = product.clone();
        product.nutriments = product.nutriments.normalized();
        Ok(serde_json::to_value(product)?)
    }

    /// Handle GET /api/favorites/check/:product_code
    async fn handle_check(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(product_code): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let favorite = resources
            .database
            .find_favorite(auth.user_id, &product_code)
            .await?;

        Ok(json_response(
            StatusCode::OK,
            json!({ "success": true, "isFavorited": favorite.is_some() }),
        ))
    }
}
