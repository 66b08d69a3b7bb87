// ABOUTME: Bearer token authentication for route handlers
// ABOUTME: Strict authentication rejects with 401, optional authentication degrades to a guest

use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{AuthResult, TokenIdentity};
use crate::constants::messages;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::middleware::tracing::record_user;
use crate::models::User;
use crate::server::ServerResources;

/// Token from an `Authorization: Bearer <token>` header
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_whitespace().nth(1))
        .filter(|token| !token.is_empty())
}

/// Authenticate a request that requires a signed-in user
///
/// The profile fills in the email and role the token lacks. A token whose
/// user was purged or moved to the trash no longer authenticates.
///
/// # Errors
///
/// Returns 401 when the header is missing, the token does not verify or the
/// user is no longer active, and a database error when the profile lookup fails
pub async fn authenticate(headers: &HeaderMap, resources: &ServerResources) -> AppResult<AuthResult> {
    let token = bearer_token(headers).ok_or_else(|| AppError::auth_required(messages::NO_TOKEN))?;

    let identity = resources.auth_manager.verify(token).map_err(|e| {
        AppLogger::log_auth_event("unknown", "token_validation", false, Some(&e.to_string()));
        AppError::auth_invalid(messages::INVALID_TOKEN).with_source(e)
    })?;

    let Some(profile) = active_user(resources, identity.user_id).await? else {
        let user_id = identity.user_id.to_string();
        AppLogger::log_security_event(
            "inactive_user_token",
            "token belongs to a missing or deleted user",
            Some(&user_id),
        );
        return Err(AppError::auth_invalid(messages::INVALID_TOKEN));
    };

    record_user(&identity.user_id);
    Ok(merge_identity(identity, &profile))
}

/// Authenticate a request where signing in is optional
///
/// Missing or invalid tokens, and tokens whose user is gone or soft deleted,
/// yield `None` so the handler can continue as a guest.
pub async fn authenticate_optional(
    headers: &HeaderMap,
    resources: &ServerResources,
) -> Option<AuthResult> {
    let token = bearer_token(headers)?;

    let identity = match resources.auth_manager.verify(token) {
        Ok(identity) => identity,
        Err(e) => {
            debug!("Continuing as guest: {e}");
            return None;
        }
    };

    let profile = match active_user(resources, identity.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            debug!(user_id = %identity.user_id, "Continuing as guest: user missing or deleted");
            return None;
        }
        Err(e) => {
            debug!("Continuing as guest: {e}");
            return None;
        }
    };

    record_user(&identity.user_id);
    Some(merge_identity(identity, &profile))
}

/// Profile of a user that exists and is not in the trash
async fn active_user(resources: &ServerResources, user_id: Uuid) -> AppResult<Option<User>> {
    Ok(resources
        .database
        .get_user(user_id)
        .await?
        .filter(|user| !user.is_deleted()))
}

fn merge_identity(identity: TokenIdentity, profile: &User) -> AuthResult {
    AuthResult {
        user_id: identity.user_id,
        name: identity
            .name
            .filter(|name| !name.is_empty())
            .or_else(|| Some(profile.name.clone())),
        email: identity.email.or_else(|| Some(profile.email.clone())),
        role: profile.role,
    }
}
