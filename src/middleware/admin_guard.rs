// ABOUTME: Central admin authorization guard for routes requiring admin privileges
// ABOUTME: Verifies the caller's profile has the admin role and returns 403 Forbidden if not
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Admin Authorization Guard
//!
//! Handlers call [`require_admin`] after authenticating instead of checking
//! roles inline.
//!
//! # Usage
//!
//! ```rust,no_run
//! use scanbar_server::auth::AuthResult;
//! use scanbar_server::database::Database;
//! use scanbar_server::middleware::admin_guard::require_admin;
//!
//! async fn admin_handler(
//!     auth: AuthResult,
//!     database: &Database,
//! ) -> Result<String, scanbar_server::errors::AppError> {
//!     let admin = require_admin(&auth, database).await?;
//!     Ok(format!("Welcome admin: {}", admin.email))
//! }
//! ```

use crate::auth::AuthResult;
use crate::constants::messages;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::User;

/// Require admin privileges for an authenticated caller
///
/// The role is read from the stored profile, never from the token.
///
/// # Errors
///
/// Returns 403 when the profile is missing or not an admin, and a database
/// error when the lookup fails
pub async fn require_admin(auth: &AuthResult, database: &Database) -> AppResult<User> {
    let user = database
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::permission_denied(messages::PROFILE_NOT_FOUND))?;

    if !user.role.is_admin() {
        AppLogger::log_security_event(
            "admin_access_denied",
            "Non-admin attempted an admin route",
            Some(&auth.user_id.to_string()),
        );
        return Err(AppError::permission_denied(messages::NOT_ADMIN));
    }

    Ok(user)
}
