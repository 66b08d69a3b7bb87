// ABOUTME: Route module organization for the ScanBar HTTP API
// ABOUTME: One route struct per domain plus the small helpers their handlers share
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the ScanBar server
//!
//! Each domain module exposes an `XRoutes::routes(resources)` constructor and
//! thin handlers that delegate to the database and service layers.
//!
//! Expected failures (a missing product, a wrong password) keep the JSON
//! shapes the mobile and web clients already read, built with
//! [`json_response`]. Unexpected failures propagate as
//! [`AppError`](crate::errors::AppError).

/// Administrator dashboard routes
pub mod admin;
/// Food photo analysis routes
pub mod ai;
/// Health news routes
pub mod articles;
/// In-app assistant routes
pub mod chatbot;
/// Favorite product routes
pub mod favorites;
/// Food journal routes
pub mod foods;
/// Health check routes
pub mod health;
/// Barcode product routes
pub mod products;
/// Account and profile routes
pub mod users;

pub use admin::AdminRoutes;
pub use ai::AiRoutes;
pub use articles::ArticleRoutes;
pub use chatbot::ChatbotRoutes;
pub use favorites::FavoriteRoutes;
pub use foods::FoodRoutes;
pub use health::HealthRoutes;
pub use products::ProductRoutes;
pub use users::{UserResponse, UserRoutes};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

/// JSON body with an explicit status
pub(crate) fn json_response(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// `{"message": ...}` body used by the account routes
pub(crate) fn message_response(status: StatusCode, message: &str) -> Response {
    json_response(status, json!({ "message": message }))
}

/// `{"msg": ...}` body used by the journal, product and admin routes
pub(crate) fn msg_response(status: StatusCode, message: &str) -> Response {
    json_response(status, json!({ "msg": message }))
}

/// Coerce a loosely typed JSON value to a number
///
/// Numbers pass through, numeric strings are parsed and anything else counts
/// as 0, the way the clients have always been treated.
#[must_use]
pub fn number_or_zero(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Serde helper for optional numeric fields the clients may send as strings
///
/// A missing field or `null` stays `None`; any other value goes through
/// [`number_or_zero`].
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| !v.is_null())
        .map(|v| number_or_zero(&v)))
}

/// Serde helper for optional text fields where an empty string means "absent"
pub(crate) fn non_empty_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
