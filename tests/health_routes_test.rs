// ABOUTME: Integration tests for the root banner and the health and readiness endpoints
// ABOUTME: Runs the full router so middleware is exercised as well
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{create_default_resources, create_test_router};
use helpers::axum_test::AxumTestRequest;
use scanbar_server::{constants::service, middleware::REQUEST_ID_HEADER};
use serde_json::Value;

#[tokio::test]
async fn test_root_banner() {
    let resources = create_default_resources().await.unwrap();

    let response = AxumTestRequest::get("/")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), "API is running...");
}

#[tokio::test]
async fn test_health_and_ready() {
    let resources = create_default_resources().await.unwrap();

    let response = AxumTestRequest::get("/health")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], service::SERVICE_NAME);
    assert_eq!(body["version"], service::SERVICE_VERSION);
    assert!(body["timestamp"].is_string());

    let response = AxumTestRequest::get("/ready")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let resources = create_default_resources().await.unwrap();

    let response = AxumTestRequest::get("/api/nothing-here")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_responses_carry_a_request_id() {
    let resources = create_default_resources().await.unwrap();

    let response = AxumTestRequest::get("/health")
        .send(create_test_router(&resources))
        .await;
    let generated = response.header(REQUEST_ID_HEADER).unwrap();
    assert!(!generated.is_empty());

    let response = AxumTestRequest::get("/health")
        .header(REQUEST_ID_HEADER, "req-scan-42")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.header(REQUEST_ID_HEADER).as_deref(), Some("req-scan-42"));
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin_by_default() {
    let resources = create_default_resources().await.unwrap();

    let response = AxumTestRequest::options("/api/products/8996001600269")
        .header("origin", "http://localhost:8081")
        .header("access-control-request-method", "GET")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.header("access-control-allow-origin").as_deref(),
        Some("*")
    );
}
