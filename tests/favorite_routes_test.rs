// ABOUTME: Integration tests for the favorite product route handlers
// ABOUTME: Tests toggling, product creation from client data, listing and membership checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use common::{create_default_resources, create_test_router, create_verified_user};
use helpers::axum_test::AxumTestRequest;
use scanbar_server::{constants::messages, constants::product_sources, server::ServerResources};
use serde_json::{json, Value};

async fn toggle(resources: &Arc<ServerResources>, bearer: &str, body: Value) -> (u16, Value) {
    let response = AxumTestRequest::post("/api/favorites")
        .header("authorization", bearer)
        .json(&body)
        .send(create_test_router(resources))
        .await;
    (response.status(), response.json())
}

async fn is_favorited(resources: &Arc<ServerResources>, bearer: &str, code: &str) -> bool {
    let response = AxumTestRequest::get(&format!("/api/favorites/check/{code}"))
        .header("authorization", bearer)
        .send(create_test_router(resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    body["isFavorited"].as_bool().unwrap()
}

#[tokio::test]
async fn test_toggle_creates_product_from_client_data() {
    let resources = create_default_resources().await.unwrap();
    let (_, bearer) = create_verified_user(&resources, "fav@example.com").await.unwrap();

    let (status, body) = toggle(
        &resources,
        &bearer,
        json!({
            "productCode": "8992761111111",
            "productData": {
                "productName": "Biskuit Kelapa",
                "imageUrl": "https://img.example/biskuit.jpg",
                "nutriments": { "energy-kcal": 480, "sugars": 22 }
            }
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["isFavorited"], true);
    assert_eq!(body["message"], messages::FAVORITE_ADDED);

    let product = resources
        .database
        .get_product("8992761111111")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.product_name, "Biskuit Kelapa");
    assert_eq!(product.source, product_sources::USER_FAVORITE);
    assert!(is_favorited(&resources, &bearer, "8992761111111").await);

    let (status, body) = toggle(&resources, &bearer, json!({ "productCode": "8992761111111" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["isFavorited"], false);
    assert_eq!(body["message"], messages::FAVORITE_REMOVED);
    assert!(!is_favorited(&resources, &bearer, "8992761111111").await);
}

#[tokio::test]
async fn test_toggle_validation() {
    let resources = create_default_resources().await.unwrap();
    let (_, bearer) = create_verified_user(&resources, "fav@example.com").await.unwrap();

    let (status, body) = toggle(&resources, &bearer, json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], messages::PRODUCT_CODE_REQUIRED);

    let (status, body) = toggle(&resources, &bearer, json!({ "productCode": "12345678" })).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], messages::FAVORITE_PRODUCT_MISSING);
}

#[tokio::test]
async fn test_list_joins_products_with_normalized_nutriments() {
    let resources = create_default_resources().await.unwrap();
    let (_, bearer) = create_verified_user(&resources, "fav@example.com").await.unwrap();
    let (_, other_bearer) = create_verified_user(&resources, "lain@example.com")
        .await
        .unwrap();

    toggle(
        &resources,
        &bearer,
        json!({
            "productCode": "8992761111111",
            "productData": {
                "productName": "Biskuit Kelapa",
                "nutriments": { "energy-kcal": 480, "sodium": 0.4 }
            }
        }),
    )
    .await;
    toggle(
        &resources,
        &other_bearer,
        json!({ "productCode": "8992761111111" }),
    )
    .await;

    let response = AxumTestRequest::get("/api/favorites")
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let favorites = body["favorites"].as_array().unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0]["productCode"], "8992761111111");
    let nutriments = &favorites[0]["product"]["nutriments"];
    assert_eq!(nutriments["energy-kcal_100g"], 480);
    assert_eq!(nutriments["calories"], 480);
    assert_eq!(nutriments["salt_100g"], 0.4);
    assert_eq!(nutriments["proteins_100g"], 0);

    assert!(is_favorited(&resources, &other_bearer, "8992761111111").await);
}

#[tokio::test]
async fn test_favorites_require_sign_in() {
    let resources = create_default_resources().await.unwrap();

    let response = AxumTestRequest::get("/api/favorites")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_concurrent_toggles_never_collide() {
    let resources = create_default_resources().await.unwrap();
    let (_, bearer) = create_verified_user(&resources, "cepat@example.com")
        .await
        .unwrap();
    let body = json!({
        "productCode": "8998866200301",
        "productData": { "productName": "Kopi Susu", "nutriments": { "energy-kcal": 120 } }
    });

    let (first, second) = tokio::join!(
        toggle(&resources, &bearer, body.clone()),
        toggle(&resources, &bearer, body.clone()),
    );
    assert_eq!(first.0, 200, "{}", first.1);
    assert_eq!(second.0, 200, "{}", second.1);

    let added = [&first.1, &second.1]
        .iter()
        .filter(|response| response["isFavorited"] == true)
        .count();
    assert_eq!(added, 1);
    assert!(!is_favorited(&resources, &bearer, "8998866200301").await);
    assert_eq!(resources.database.count_products().await.unwrap(), 1);
}
