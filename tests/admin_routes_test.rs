// ABOUTME: Integration tests for the administrator route handlers
// ABOUTME: Tests product request triage, dashboard statistics and user trash management
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use chrono::Utc;
use common::{create_admin_user, create_default_resources, create_test_router, create_verified_user};
use helpers::axum_test::AxumTestRequest;
use scanbar_server::{
    constants::messages,
    models::{ProductRequest, Requester, User},
    server::ServerResources,
    services::record_request,
};
use serde_json::{json, Value};
use uuid::Uuid;

// ============================================================================
// Test Helpers
// ============================================================================

async fn setup() -> (Arc<ServerResources>, User, String) {
    let resources = create_default_resources().await.unwrap();
    let (admin, bearer) = create_admin_user(&resources, "admin@example.com")
        .await
        .unwrap();
    (resources, admin, bearer)
}

async fn queue_request(resources: &Arc<ServerResources>, barcode: &str) -> ProductRequest {
    let requester = Requester::new(Uuid::new_v4(), Some("Rina"), Some("rina@example.com"));
    record_request(&resources.database, barcode, &requester)
        .await
        .unwrap()
}

async fn get_json(resources: &Arc<ServerResources>, bearer: &str, uri: &str) -> (u16, Value) {
    let response = AxumTestRequest::get(uri)
        .header("authorization", bearer)
        .send(create_test_router(resources))
        .await;
    (response.status(), response.json())
}

// ============================================================================
// Access Control
// ============================================================================

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let (resources, _, _) = setup().await;
    let (_, bearer) = create_verified_user(&resources, "biasa@example.com")
        .await
        .unwrap();

    for uri in [
        "/api/admin/product-requests",
        "/api/admin/stats",
        "/api/admin/users",
        "/api/admin/users/trash",
    ] {
        let (status, body) = get_json(&resources, &bearer, uri).await;
        assert_eq!(status, 403, "{uri}");
        assert_eq!(body["msg"], messages::NOT_ADMIN);
    }

    let response = AxumTestRequest::get("/api/admin/stats")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 401);
}

// ============================================================================
// Product Requests
// ============================================================================

#[tokio::test]
async fn test_list_and_count_product_requests() {
    let (resources, _, bearer) = setup().await;
    queue_request(&resources, "11110000").await;
    queue_request(&resources, "22220000").await;
    queue_request(&resources, "22220000").await;

    let (status, body) = get_json(&resources, &bearer, "/api/admin/product-requests/count").await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], 2);

    let (status, body) = get_json(&resources, &bearer, "/api/admin/product-requests").await;
    assert_eq!(status, 200);
    let requests = body.as_array().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["barcode"], "22220000");
    assert_eq!(requests[0]["attemptCount"], 2);
    assert_eq!(requests[0]["requestedByName"], "Rina");
    assert_eq!(requests[0]["status"], "pending");

    let (status, body) =
        get_json(&resources, &bearer, "/api/admin/product-requests?status=completed").await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 0);

    let (status, _) = get_json(&resources, &bearer, "/api/admin/product-requests?status=lost").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_update_request_status() {
    let (resources, admin, bearer) = setup().await;
    let request = queue_request(&resources, "11110000").await;
    let uri = format!("/api/admin/product-requests/{}/status", request.id);

    let response = AxumTestRequest::put(&uri)
        .header("authorization", &bearer)
        .json(&json!({ "status": "archived" }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::STATUS_INVALID);

    let response = AxumTestRequest::put(&uri)
        .header("authorization", &bearer)
        .json(&json!({ "status": "rejected", "adminNotes": "Bukan produk makanan" }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::STATUS_UPDATED);
    assert_eq!(body["request"]["status"], "rejected");
    assert_eq!(body["request"]["adminNotes"], "Bukan produk makanan");
    assert_eq!(body["request"]["resolvedBy"], admin.id.to_string());
    assert!(body["request"]["resolvedAt"].is_string());

    let response = AxumTestRequest::put(&format!(
        "/api/admin/product-requests/{}/status",
        Uuid::new_v4()
    ))
    .header("authorization", &bearer)
    .json(&json!({ "status": "processing" }))
    .send(create_test_router(&resources))
    .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_bulk_update_resolves_only_pending_requests() {
    let (resources, _, bearer) = setup().await;
    queue_request(&resources, "11110000").await;
    queue_request(&resources, "99990000").await;

    let response = AxumTestRequest::put("/api/admin/product-requests/bulk-update")
        .header("authorization", &bearer)
        .json(&json!({}))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::BARCODE_REQUIRED);

    let response = AxumTestRequest::put("/api/admin/product-requests/bulk-update")
        .header("authorization", &bearer)
        .json(&json!({ "barcode": "1111-0000" }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["modifiedCount"], 1);
    assert_eq!(body["msg"], "1 request(s) updated");

    let (_, body) = get_json(&resources, &bearer, "/api/admin/product-requests/count").await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_delete_product_request() {
    let (resources, _, bearer) = setup().await;
    let request = queue_request(&resources, "11110000").await;
    let uri = format!("/api/admin/product-requests/{}", request.id);

    let response = AxumTestRequest::delete(&uri)
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::REQUEST_DELETED);

    let response = AxumTestRequest::delete(&uri)
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 404);
}

// ============================================================================
// Statistics and Users
// ============================================================================

#[tokio::test]
async fn test_stats_count_active_users_products_and_articles() {
    let (resources, _, bearer) = setup().await;
    let (user, _) = create_verified_user(&resources, "satu@example.com")
        .await
        .unwrap();
    create_verified_user(&resources, "dua@example.com")
        .await
        .unwrap();
    resources
        .database
        .soft_delete_user(user.id, Utc::now())
        .await
        .unwrap();

    let (status, body) = get_json(&resources, &bearer, "/api/admin/stats").await;
    assert_eq!(status, 200);
    assert_eq!(body["totalUsers"], 2);
    assert_eq!(body["totalProducts"], 0);
    assert_eq!(body["totalArticles"], 0);
}

#[tokio::test]
async fn test_soft_delete_restore_and_purge_user() {
    let (resources, admin, bearer) = setup().await;
    let (user, user_bearer) = create_verified_user(&resources, "target@example.com")
        .await
        .unwrap();

    let response = AxumTestRequest::delete(&format!("/api/admin/users/{}", admin.id))
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 403);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::CANNOT_DELETE_ADMIN);

    let response = AxumTestRequest::delete(&format!("/api/admin/users/{}", user.id))
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::USER_DEACTIVATED);

    let (_, active) = get_json(&resources, &bearer, "/api/admin/users").await;
    assert!(active
        .as_array()
        .unwrap()
        .iter()
        .all(|u| u["email"] != "target@example.com"));

    let (_, trash) = get_json(&resources, &bearer, "/api/admin/users/trash").await;
    let trash = trash.as_array().unwrap();
    assert_eq!(trash.len(), 1);
    assert_eq!(trash[0]["email"], "target@example.com");
    assert!(trash[0]["deletedAt"].is_string());

    // Trashed users cannot log in
    let response = AxumTestRequest::post("/api/users/login")
        .json(&json!({ "email": "target@example.com", "password": "anything" }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 400);

    let response = AxumTestRequest::put(&format!("/api/admin/users/{}/restore", user.id))
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::USER_RESTORED);

    let (status, _) = get_json(&resources, &user_bearer, "/api/users/profile").await;
    assert_eq!(status, 200);

    let response = AxumTestRequest::delete(&format!("/api/admin/users/{}/permanent", user.id))
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(resources.database.get_user(user.id).await.unwrap().is_none());

    let response = AxumTestRequest::delete(&format!("/api/admin/users/{}/permanent", user.id))
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_removed_users_lose_their_sessions() {
    let (resources, _, bearer) = setup().await;
    let (user, user_bearer) = create_verified_user(&resources, "pergi@example.com")
        .await
        .unwrap();
    let entry = json!({ "productName": "Teh Manis", "calories": 90 });

    let response = AxumTestRequest::delete(&format!("/api/admin/users/{}", user.id))
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);

    let (status, body) = get_json(&resources, &user_bearer, "/api/users/profile").await;
    assert_eq!(status, 401);
    assert_eq!(body["msg"], messages::INVALID_TOKEN);

    let response = AxumTestRequest::post("/api/foods")
        .header("authorization", &user_bearer)
        .json(&entry)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 401);

    let response = AxumTestRequest::delete(&format!("/api/admin/users/{}/permanent", user.id))
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);

    let response = AxumTestRequest::post("/api/foods")
        .header("authorization", &user_bearer)
        .json(&entry)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "AUTH_INVALID");

    let (status, _) = get_json(&resources, &user_bearer, "/api/products/12345678").await;
    assert_eq!(status, 401);
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
async fn test_restore_unknown_user_is_not_found() {
    let (resources, _, bearer) = setup().await;

    let response = AxumTestRequest::put("/api/admin/users/not-a-uuid/restore")
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::USER_NOT_FOUND);
}
