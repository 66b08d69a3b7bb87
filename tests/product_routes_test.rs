// ABOUTME: Integration tests for the barcode product route handlers
// ABOUTME: Tests cache hits, Open Food Facts outcomes, product requests and admin catalog edits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{create_admin_user, create_test_resources, create_test_router, create_verified_user};
use helpers::axum_test::AxumTestRequest;
use helpers::fixtures::{bare_product, tea_product, BARE_BARCODE, TEA_BARCODE};
use scanbar_server::{
    constants::{defaults, messages, product_sources},
    external::{MockNewsSource, MockProductCatalog},
    models::RequestStatus,
    server::ServerResources,
};
use serde_json::{json, Value};

// ============================================================================
// Test Helpers
// ============================================================================

const SLOW_BARCODE: &str = "11112222";
const DOWN_BARCODE: &str = "33334444";

async fn setup() -> (Arc<ServerResources>, Arc<MockProductCatalog>, String) {
    let catalog = Arc::new(
        MockProductCatalog::new()
            .with_product(TEA_BARCODE, tea_product())
            .with_product(BARE_BARCODE, bare_product())
            .with_timeout(SLOW_BARCODE)
            .with_unavailable(DOWN_BARCODE),
    );
    let resources = create_test_resources(catalog.clone(), Arc::new(MockNewsSource::new()), None)
        .await
        .unwrap();
    let (_, bearer) = create_verified_user(&resources, "pemindai@example.com")
        .await
        .unwrap();
    (resources, catalog, bearer)
}

async fn lookup(resources: &Arc<ServerResources>, bearer: &str, code: &str) -> (u16, Value) {
    let response = AxumTestRequest::get(&format!("/api/products/{code}"))
        .header("authorization", bearer)
        .send(create_test_router(resources))
        .await;
    (response.status(), response.json())
}

// ============================================================================
// Lookup
// ============================================================================

#[tokio::test]
async fn test_lookup_fetches_then_serves_from_cache() {
    let (resources, catalog, bearer) = setup().await;

    let (status, body) = lookup(&resources, &bearer, TEA_BARCODE).await;
    assert_eq!(status, 200);
    assert_eq!(body["cached"], false);
    assert_eq!(body["product_name"], "Teh Botol Sosro");
    assert_eq!(body["source"], product_sources::OPEN_FOOD_FACTS);
    assert_eq!(body["nutriments"]["calories"], 36);
    assert_eq!(body["nutriments"]["carbs"], 9);
    assert_eq!(
        body["image_url"],
        "https://images.openfoodfacts.org/teh-botol-front.jpg"
    );

    let (status, body) = lookup(&resources, &bearer, TEA_BARCODE).await;
    assert_eq!(status, 200);
    assert_eq!(body["cached"], true);
    assert_eq!(body["brands"], "Sosro");
    assert_eq!(catalog.call_count(), 1);
}

#[tokio::test]
async fn test_lookup_normalizes_barcode_and_rejects_short_codes() {
    let (resources, catalog, bearer) = setup().await;

    let (status, body) = lookup(&resources, &bearer, "8996-0016-00269").await;
    assert_eq!(status, 200);
    assert_eq!(body["code"], TEA_BARCODE);

    let (status, body) = lookup(&resources, &bearer, "12-34").await;
    assert_eq!(status, 400);
    assert_eq!(body["msg"], messages::BARCODE_TOO_SHORT);
    assert_eq!(catalog.call_count(), 1);
}

#[tokio::test]
async fn test_unknown_barcode_queues_a_single_request() {
    let (resources, _, bearer) = setup().await;

    for _ in 0..2 {
        let (status, body) = lookup(&resources, &bearer, "99990000").await;
        assert_eq!(status, 404);
        assert_eq!(body["msg"], messages::PRODUCT_NOT_FOUND_ANYWHERE);
        assert_eq!(body["suggestion"], messages::SUGGEST_MANUAL_INPUT);
    }

    let requests = resources
        .database
        .list_product_requests(Some(RequestStatus::Pending))
        .await
        .unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].barcode, "99990000");
    assert_eq!(requests[0].attempt_count, 2);
    assert_eq!(requests[0].requested_by_email, "pemindai@example.com");
}

#[tokio::test]
async fn test_incomplete_nutrition_is_not_cached() {
    let (resources, _, bearer) = setup().await;

    let (status, body) = lookup(&resources, &bearer, BARE_BARCODE).await;
    assert_eq!(status, 404);
    assert_eq!(body["msg"], messages::PRODUCT_INCOMPLETE);
    assert_eq!(body["productName"], "Kerupuk Udang");

    assert!(resources
        .database
        .get_product(BARE_BARCODE)
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        resources
            .database
            .count_pending_product_requests()
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_upstream_failures_map_to_gateway_statuses() {
    let (resources, _, bearer) = setup().await;

    let (status, body) = lookup(&resources, &bearer, SLOW_BARCODE).await;
    assert_eq!(status, 504);
    assert_eq!(body["msg"], messages::UPSTREAM_TIMEOUT);

    let (status, body) = lookup(&resources, &bearer, DOWN_BARCODE).await;
    assert_eq!(status, 503);
    assert_eq!(body["msg"], messages::UPSTREAM_FAILED);

    // Upstream outages are not the product's fault
    assert_eq!(
        resources
            .database
            .count_pending_product_requests()
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_lookup_requires_sign_in() {
    let (resources, _, _) = setup().await;

    let response = AxumTestRequest::get(&format!("/api/products/{TEA_BARCODE}"))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 401);
}

// ============================================================================
// Admin Catalog Edits
// ============================================================================

#[tokio::test]
async fn test_admin_create_product_resolves_pending_requests() {
    let (resources, _, bearer) = setup().await;
    let (_, admin_bearer) = create_admin_user(&resources, "admin@example.com")
        .await
        .unwrap();

    lookup(&resources, &bearer, "77778888").await;
    assert_eq!(
        resources
            .database
            .count_pending_product_requests()
            .await
            .unwrap(),
        1
    );

    let response = AxumTestRequest::post("/api/products")
        .header("authorization", &admin_bearer)
        .json(&json!({
            "code": " 7777-8888 ",
            "product_name": "Susu Kedelai",
            "calories": "54",
            "proteins": 3.3,
            "sodium": 0.05
        }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::PRODUCT_SAVED);
    assert_eq!(body["product"]["code"], "77778888");
    assert_eq!(body["product"]["brands"], messages::UNKNOWN_BRAND);
    assert_eq!(body["product"]["image_url"], defaults::PLACEHOLDER_IMAGE_URL);
    assert_eq!(body["product"]["source"], product_sources::LOCAL_ADMIN_INPUT);
    assert_eq!(body["product"]["nutriments"]["sodium_100g"], 0.05);

    let requests = resources
        .database
        .list_product_requests(Some(RequestStatus::Completed))
        .await
        .unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].admin_notes.as_deref(),
        Some(messages::NOTE_PRODUCT_ADDED)
    );

    let (status, body) = lookup(&resources, &bearer, "77778888").await;
    assert_eq!(status, 200);
    assert_eq!(body["cached"], true);
    assert_eq!(body["product_name"], "Susu Kedelai");
}

#[tokio::test]
async fn test_admin_create_product_validation() {
    let (resources, _, bearer) = setup().await;
    let (_, admin_bearer) = create_admin_user(&resources, "admin@example.com")
        .await
        .unwrap();

    let response = AxumTestRequest::post("/api/products")
        .header("authorization", &bearer)
        .json(&json!({ "code": "12345678", "product_name": "X" }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 403);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::NOT_ADMIN);

    let response = AxumTestRequest::post("/api/products")
        .header("authorization", &admin_bearer)
        .json(&json!({ "code": "12345678" }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::PRODUCT_FIELDS_REQUIRED);

    for expected in [StatusCode::OK, StatusCode::BAD_REQUEST] {
        AxumTestRequest::post("/api/products")
            .header("authorization", &admin_bearer)
            .json(&json!({ "code": "12345678", "product_name": "Kopi Susu" }))
            .send(create_test_router(&resources))
            .await
            .assert_status(expected);
    }
}

#[tokio::test]
async fn test_admin_update_and_delete_product() {
    let (resources, _, bearer) = setup().await;
    let (_, admin_bearer) = create_admin_user(&resources, "admin@example.com")
        .await
        .unwrap();
    lookup(&resources, &bearer, TEA_BARCODE).await;

    let response = AxumTestRequest::put(&format!("/api/products/{TEA_BARCODE}"))
        .header("authorization", &admin_bearer)
        .json(&json!({ "product_name": "Teh Botol Less Sugar", "calories": 20, "sugar": 4 }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::PRODUCT_UPDATED);

    let stored = resources
        .database
        .get_product(TEA_BARCODE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.product_name, "Teh Botol Less Sugar");
    assert_eq!(stored.nutriments.number("sugar"), Some(4.0));

    let response = AxumTestRequest::delete(&format!("/api/products/{TEA_BARCODE}"))
        .header("authorization", &admin_bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);

    let response = AxumTestRequest::delete(&format!("/api/products/{TEA_BARCODE}"))
        .header("authorization", &admin_bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::PRODUCT_NOT_FOUND);
}
