// ABOUTME: Request tracing helpers for correlation and structured logging
// ABOUTME: Names the request ID header and builds the per-request span used by the trace layer

use axum::http::Request;
use tracing::field::{display, Empty};
use tracing::{info_span, Span};
use uuid::Uuid;

/// Header carrying the request ID, taken from the client or generated
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Create a tracing span for an HTTP request
///
/// The request ID is read from the header set by `SetRequestIdLayer`, so this
/// span must be created inside that layer.
pub fn create_request_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
        user_id = Empty,
    )
}

/// Record the authenticated user on the current request span
pub fn record_user(user_id: &Uuid) {
    Span::current().record("user_id", display(user_id));
}
