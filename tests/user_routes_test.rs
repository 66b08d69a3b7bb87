// ABOUTME: Integration tests for the account route handlers
// ABOUTME: Tests registration, email verification, login, password reset, goals and profile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{create_default_resources, create_test_router, create_verified_user};
use helpers::axum_test::AxumTestRequest;
use scanbar_server::{
    auth::{hash_password, sha256_hex},
    constants::messages,
    models::User,
    server::ServerResources,
};
use serde_json::{json, Value};

// ============================================================================
// Test Helpers
// ============================================================================

/// Store an unverified user whose verification link carries `token`
async fn create_pending_user(
    resources: &Arc<ServerResources>,
    email: &str,
    password: &str,
    token: &str,
) -> User {
    let hash = hash_password(password.to_owned()).await.unwrap();
    let mut user = User::new("Sari".to_owned(), email.to_owned(), hash);
    user.verification_token_hash = Some(sha256_hex(token));
    resources.database.create_user(&user).await.unwrap();
    user
}

async fn login(resources: &Arc<ServerResources>, email: &str, password: &str) -> (u16, Value) {
    let response = AxumTestRequest::post("/api/users/login")
        .json(&json!({ "email": email, "password": password }))
        .send(create_test_router(resources))
        .await;
    (response.status(), response.json())
}

// ============================================================================
// Registration and Verification
// ============================================================================

#[tokio::test]
async fn test_register_creates_unverified_account() {
    let resources = create_default_resources().await.unwrap();

    let response = AxumTestRequest::post("/api/users/register")
        .json(&json!({
            "name": "Budi",
            "email": "budi@example.com",
            "password": "rahasia123"
        }))
        .send(create_test_router(&resources))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["message"], messages::REGISTERED);

    let user = resources
        .database
        .get_user_by_email("budi@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_verified);
    assert!(user.verification_token_hash.is_some());
    assert_ne!(user.password_hash, "rahasia123");

    let (status, body) = login(&resources, "budi@example.com", "rahasia123").await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], messages::NOT_VERIFIED);
}

#[tokio::test]
async fn test_register_rejects_missing_fields_and_duplicates() {
    let resources = create_default_resources().await.unwrap();
    create_verified_user(&resources, "ani@example.com").await.unwrap();

    let response = AxumTestRequest::post("/api/users/register")
        .json(&json!({ "name": "Ani", "email": "", "password": "x" }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], messages::REGISTER_FIELDS_REQUIRED);

    let response = AxumTestRequest::post("/api/users/register")
        .json(&json!({ "name": "Ani", "email": "ani@example.com", "password": "x" }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], messages::EMAIL_TAKEN);
}

#[tokio::test]
async fn test_verify_email_then_login() {
    let resources = create_default_resources().await.unwrap();
    create_pending_user(&resources, "sari@example.com", "sandi-kuat", "verify-me").await;

    let response = AxumTestRequest::get("/api/users/verifyemail/verify-me")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text(), messages::VERIFY_OK_HTML);

    // The token is single use
    let response = AxumTestRequest::get("/api/users/verifyemail/verify-me")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(response.text(), messages::VERIFY_FAILED_HTML);

    let (status, body) = login(&resources, "sari@example.com", "sandi-kuat").await;
    assert_eq!(status, 200);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "sari@example.com");
    assert_eq!(body["user"]["isVerified"], true);
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let resources = create_default_resources().await.unwrap();
    create_pending_user(&resources, "sari@example.com", "sandi-kuat", "t").await;

    let (status, body) = login(&resources, "sari@example.com", "salah").await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], messages::BAD_CREDENTIALS);

    let (status, body) = login(&resources, "nobody@example.com", "salah").await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], messages::BAD_CREDENTIALS);
}

// ============================================================================
// Password Reset
// ============================================================================

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let resources = create_default_resources().await.unwrap();
    let (user, _) = create_verified_user(&resources, "rudi@example.com").await.unwrap();

    for email in ["rudi@example.com", "ghost@example.com"] {
        let response = AxumTestRequest::post("/api/users/forgotpassword")
            .json(&json!({ "email": email }))
            .send(create_test_router(&resources))
            .await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json();
        assert_eq!(body["message"], messages::RESET_LINK_SENT);
    }

    let stored = resources.database.get_user(user.id).await.unwrap().unwrap();
    assert!(stored.reset_token.is_some());
    assert!(stored.reset_expires_at.is_some_and(|at| at > Utc::now()));
}

#[tokio::test]
async fn test_reset_password_with_valid_token() {
    let resources = create_default_resources().await.unwrap();
    let user = create_pending_user(&resources, "dewi@example.com", "lama", "v").await;
    resources.database.mark_user_verified(user.id).await.unwrap();
    resources
        .database
        .set_reset_token(
            user.id,
            &sha256_hex("reset-token"),
            Utc::now() + Duration::minutes(15),
        )
        .await
        .unwrap();

    let response = AxumTestRequest::put("/api/users/resetpassword/reset-token")
        .json(&json!({}))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], messages::PASSWORD_REQUIRED);

    let response = AxumTestRequest::put("/api/users/resetpassword/reset-token")
        .json(&json!({ "password": "baru" }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], messages::PASSWORD_CHANGED);

    let (status, _) = login(&resources, "dewi@example.com", "baru").await;
    assert_eq!(status, 200);

    // Consumed tokens cannot be replayed
    let response = AxumTestRequest::put("/api/users/resetpassword/reset-token")
        .json(&json!({ "password": "lagi" }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_reset_password_rejects_expired_token() {
    let resources = create_default_resources().await.unwrap();
    let (user, _) = create_verified_user(&resources, "tono@example.com").await.unwrap();
    resources
        .database
        .set_reset_token(
            user.id,
            &sha256_hex("old-token"),
            Utc::now() - Duration::minutes(1),
        )
        .await
        .unwrap();

    let response = AxumTestRequest::put("/api/users/resetpassword/old-token")
        .json(&json!({ "password": "baru" }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], messages::RESET_TOKEN_INVALID);
}

// ============================================================================
// Profile and Goals
// ============================================================================

#[tokio::test]
async fn test_profile_requires_token() {
    let resources = create_default_resources().await.unwrap();

    let response = AxumTestRequest::get("/api/users/profile")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::NO_TOKEN);
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

    let response = AxumTestRequest::get("/api/users/profile")
        .header("authorization", "Bearer not.a.token")
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 401);
    let body: Value = response.json();
    assert_eq!(body["msg"], messages::INVALID_TOKEN);
}

#[tokio::test]
async fn test_update_goals_defaults_missing_core_goals_to_zero() {
    let resources = create_default_resources().await.unwrap();
    let (_, bearer) = create_verified_user(&resources, "gita@example.com").await.unwrap();

    let response = AxumTestRequest::put("/api/users/goals")
        .header("authorization", &bearer)
        .json(&json!({ "dailyCalorieGoal": "2100", "dailySugarGoal": 50 }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["dailyCalorieGoal"], 2100.0);
    assert_eq!(body["dailyProteinGoal"], 0.0);
    assert_eq!(body["dailySugarGoal"], 50.0);
    assert_eq!(body["dailySaltGoal"], 0.0);
}

#[tokio::test]
async fn test_update_profile_ignores_blank_fields() {
    let resources = create_default_resources().await.unwrap();
    let (_, bearer) = create_verified_user(&resources, "hadi@example.com").await.unwrap();

    let response = AxumTestRequest::put("/api/users/profile")
        .header("authorization", &bearer)
        .json(&json!({
            "name": "",
            "age": "31",
            "weight": 0,
            "height": 170,
            "dailyFatGoal": 60
        }))
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["name"], "hadi");
    assert_eq!(body["age"], 31);
    assert!(body["weight"].is_null());
    assert_eq!(body["height"], 170.0);
    assert_eq!(body["dailyFatGoal"], 60.0);

    let response = AxumTestRequest::get("/api/users/profile")
        .header("authorization", &bearer)
        .send(create_test_router(&resources))
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["age"], 31);
    assert_eq!(body["role"], "user");
}
