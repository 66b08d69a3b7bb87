// ABOUTME: HTTP middleware for request tracing, authentication and CORS
// ABOUTME: Provides bearer token checks, the admin guard, request IDs and request spans

pub mod admin_guard;
pub mod auth;
pub mod cors;
pub mod tracing;

// Authentication helpers
pub use admin_guard::require_admin;
pub use auth::{authenticate, authenticate_optional, bearer_token};

// CORS configuration
pub use cors::setup_cors;

// Request tracing
pub use tracing::{create_request_span, REQUEST_ID_HEADER};
