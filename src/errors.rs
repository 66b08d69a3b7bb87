// ABOUTME: Unified error type, error codes and HTTP response mapping for the ScanBar API
// ABOUTME: Every handler and data layer returns AppResult so failures render consistently
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Error Handling
//!
//! [`AppError`] carries an [`ErrorCode`] and a user-facing message. Its
//! response body is `{"error": {code, message, details?}, "msg": message}`.
//! Routes that must keep a client's legacy body shape build those responses
//! themselves and use `AppError` for everything else.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Machine-readable error codes, serialized in `SCREAMING_SNAKE_CASE`
///
/// Discriminants group the codes by area: 1xxx access, 3xxx request
/// validation, 5xxx upstream services, 6xxx configuration, 9xxx server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No bearer token on a protected route
    AuthRequired = 1000,
    /// Bearer token that fails verification
    AuthInvalid = 1001,
    /// Signed in, but not allowed (admin routes, other users' entries)
    PermissionDenied = 1004,

    /// Request body or parameters that cannot be used
    InvalidInput = 3000,

    /// Open Food Facts, NewsAPI or Gemini answered with an error
    ExternalServiceError = 5000,
    /// Upstream unreachable or not configured
    ExternalServiceUnavailable = 5001,
    /// Upstream rejected our API key
    ExternalAuthFailed = 5002,
    /// Upstream quota exhausted
    ExternalRateLimited = 5003,
    /// Upstream did not answer in time
    ExternalTimeout = 5004,

    /// Invalid settings at startup
    ConfigError = 6000,

    InternalError = 9000,
    DatabaseError = 9001,
    /// JSON encoding or decoding failure
    SerializationError = 9003,
}

impl ErrorCode {
    /// HTTP status sent with this code
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::AuthRequired | Self::AuthInvalid => 401,
            Self::PermissionDenied => 403,
            Self::ExternalRateLimited => 429,
            Self::ExternalServiceError | Self::ExternalAuthFailed => 502,
            Self::ExternalServiceUnavailable => 503,
            Self::ExternalTimeout => 504,
            Self::InternalError
            | Self::DatabaseError
            | Self::SerializationError
            | Self::ConfigError => 500,
        }
    }

    /// Short description used as the prefix of `Display`
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Sign-in required",
            Self::AuthInvalid => "Session token rejected",
            Self::PermissionDenied => "Not allowed",
            Self::InvalidInput => "Invalid request",
            Self::ExternalServiceError => "Upstream service error",
            Self::ExternalServiceUnavailable => "Upstream service unavailable",
            Self::ExternalAuthFailed => "Upstream service rejected the API key",
            Self::ExternalRateLimited => "Upstream quota exhausted",
            Self::ExternalTimeout => "Upstream service timed out",
            Self::ConfigError => "Configuration error",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::SerializationError => "JSON error",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message, returned to the client as `msg`
    pub message: String,
    /// Optional structured details
    pub details: Option<serde_json::Value>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attach structured details to the error
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
///
/// `msg` repeats the message at the top level because the mobile and web
/// clients read it directly.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Structured error
    pub error: ErrorResponseDetails,
    /// Message shown to the user
    pub msg: String,
}

/// Structured part of an error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine readable code
    pub code: ErrorCode,
    /// Human readable message
    pub message: String,
    /// Extra context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            msg: error.message.clone(),
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                details: error.details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = ?self.code, source = ?self.source, "{}", self.message);
        } else {
            warn!(code = ?self.code, "{}", self.message);
        }
        (status, Json(ErrorResponse::from(self))).into_response()
    }
}

/// Convenience functions for creating common errors
impl AppError {
    /// Authentication required
    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthRequired, message)
    }

    /// Invalid authentication
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Caller lacks the required role or ownership
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// External service error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// External service unreachable
    pub fn external_unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceUnavailable,
            format!("{}: {}", service.into(), message.into()),
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string()).with_source(error)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        let code = if error.is_timeout() {
            ErrorCode::ExternalTimeout
        } else if error.is_connect() {
            ErrorCode::ExternalServiceUnavailable
        } else {
            ErrorCode::ExternalServiceError
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        match error.source() {
            Some(source) => Self::internal(error.to_string())
                .with_details(serde_json::json!({ "source": source.to_string() })),
            None => Self::internal(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::AuthRequired.http_status(), 401);
        assert_eq!(ErrorCode::PermissionDenied.http_status(), 403);
        assert_eq!(ErrorCode::InvalidInput.http_status(), 400);
        assert_eq!(ErrorCode::ExternalTimeout.http_status(), 504);
        assert_eq!(ErrorCode::ExternalServiceUnavailable.http_status(), 503);
        assert_eq!(ErrorCode::InternalError.http_status(), 500);
    }

    #[test]
    fn test_error_response_mirrors_message() {
        let error = AppError::invalid_input("Barcode terlalu pendek")
            .with_details(serde_json::json!({ "code": "1234" }));
        let response = ErrorResponse::from(error);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["msg"], "Barcode terlalu pendek");
        assert_eq!(json["error"]["code"], "INVALID_INPUT");
        assert_eq!(json["error"]["details"]["code"], "1234");
    }

    #[test]
    fn test_anyhow_conversion_is_internal() {
        let error: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(error.code, ErrorCode::InternalError);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
