// ABOUTME: Administrator dashboard route handlers for product requests, statistics and users
// ABOUTME: Every handler authenticates the caller and requires the admin role from the stored profile
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Admin routes
//!
//! Product request triage, dashboard counters and user management with a
//! recycle bin. Soft deleted users can be restored until they are purged.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::{json_response, msg_response, non_empty_string, UserResponse};
use crate::constants::messages;
use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::middleware::{authenticate, require_admin};
use crate::models::{RequestStatus, User};
use crate::nutrition::barcode;
use crate::server::ServerResources;

/// `GET /api/admin/product-requests` query
#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
}

/// `PUT /api/admin/product-requests/:id/status` body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub admin_notes: Option<String>,
}

/// `PUT /api/admin/product-requests/bulk-update` body
#[derive(Debug, Deserialize)]
pub struct BulkUpdateRequest {
    #[serde(default, deserialize_with = "non_empty_string")]
    pub barcode: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Administrator routes
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/admin/product-requests",
                get(Self::handle_list_requests),
            )
            .route(
                "/api/admin/product-requests/count",
                get(Self::handle_count_requests),
            )
            .route(
                "/api/admin/product-requests/bulk-update",
                put(Self::handle_bulk_update),
            )
            .route(
                "/api/admin/product-requests/:id/status",
                put(Self::handle_update_status),
            )
            .route(
                "/api/admin/product-requests/:id",
                delete(Self::handle_delete_request),
            )
            .route("/api/admin/stats", get(Self::handle_stats))
            .route("/api/admin/users", get(Self::handle_list_users))
            .route("/api/admin/users/trash", get(Self::handle_list_trash))
            .route(
                "/api/admin/users/:id/restore",
                put(Self::handle_restore_user),
            )
            .route(
                "/api/admin/users/:id/permanent",
                delete(Self::handle_purge_user),
            )
            .route("/api/admin/users/:id", delete(Self::handle_soft_delete_user))
            .with_state(resources)
    }

    async fn require_admin(
        resources: &ServerResources,
        headers: &HeaderMap,
    ) -> Result<User, AppError> {
        let auth = authenticate(headers, resources).await?;
        require_admin(&auth, &resources.database).await
    }

    /// Handle GET /api/admin/product-requests
    async fn handle_list_requests(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListRequestsQuery>,
    ) -> Result<Response, AppError> {
        Self::require_admin(&resources, &headers).await?;

        let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
            Some(status) => Some(status.parse::<RequestStatus>()?),
            None => None,
        };
        let requests = resources.database.list_product_requests(status).await?;

        Ok(Json(requests).into_response())
    }

    /// Handle GET /api/admin/product-requests/count - pending requests for the badge
    async fn handle_count_requests(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        Self::require_admin(&resources, &headers).await?;
        let count = resources.database.count_pending_product_requests().await?;
        Ok(json_response(StatusCode::OK, json!({ "count": count })))
    }

    /// Handle PUT /api/admin/product-requests/:id/status
    async fn handle_update_status(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(request): Json<UpdateStatusRequest>,
    ) -> Result<Response, AppError> {
        let admin = Self::require_admin(&resources, &headers).await?;

        let Some(status) = request
            .status
            .as_deref()
            .and_then(|s| s.parse::<RequestStatus>().ok())
        else {
            return Ok(msg_response(StatusCode::BAD_REQUEST, messages::STATUS_INVALID));
        };
        let Ok(id) = Uuid::parse_str(&id) else {
            return Ok(msg_response(StatusCode::NOT_FOUND, messages::REQUEST_NOT_FOUND));
        };

        let notes = request.admin_notes.unwrap_or_default();
        let updated = resources
            .database
            .update_product_request_status(id, status, &notes, admin.id, Utc::now())
            .await?;
        let request = if updated {
            resources.database.get_product_request(id).await?
        } else {
            None
        };
        let Some(request) = request else {
            return Ok(msg_response(StatusCode::NOT_FOUND, messages::REQUEST_NOT_FOUND));
        };

        info!(request_id = %id, status = %status, "Product request status changed");
        Ok(json_response(
            StatusCode::OK,
            json!({ "msg": messages::STATUS_UPDATED, "request": request }),
        ))
    }

    /// Handle DELETE /api/admin/product-requests/:id
    async fn handle_delete_request(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        Self::require_admin(&resources, &headers).await?;

        let deleted = match Uuid::parse_str(&id) {
            Ok(id) => resources.database.delete_product_request(id).await?,
            Err(_) => false,
        };
        if !deleted {
            return Ok(msg_response(StatusCode::NOT_FOUND, messages::REQUEST_NOT_FOUND));
        }

        Ok(msg_response(StatusCode::OK, messages::REQUEST_DELETED))
    }

    /// Handle PUT /api/admin/product-requests/bulk-update
    ///
    /// Resolves every pending request for a barcode, usually right after the
    /// product was added.
    async fn handle_bulk_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<BulkUpdateRequest>,
    ) -> Result<Response, AppError> {
        let admin = Self::require_admin(&resources, &headers).await?;

        let Some(raw_barcode) = request.barcode else {
            return Ok(msg_response(StatusCode::BAD_REQUEST, messages::BARCODE_REQUIRED));
        };
        let status = match request.status.as_deref() {
            None => RequestStatus::Completed,
            Some(status) => match status.parse::<RequestStatus>() {
                Ok(status) => status,
                Err(_) => {
                    return Ok(msg_response(StatusCode::BAD_REQUEST, messages::STATUS_INVALID))
                }
            },
        };

        let barcode = barcode::normalize(&raw_barcode);
        let modified = resources
            .database
            .resolve_pending_product_requests(
                &barcode,
                status,
                messages::NOTE_BULK_RESOLVED,
                admin.id,
                Utc::now(),
            )
            .await?;

        info!(barcode = %barcode, modified, "Bulk-updated product requests");
        Ok(json_response(
            StatusCode::OK,
            json!({
                "msg": format!("{modified} request(s) updated"),
                "modifiedCount": modified
            }),
        ))
    }

    /// Handle GET /api/admin/stats
    async fn handle_stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        Self::require_admin(&resources, &headers).await?;

        let database = &resources.database;
        let total_users = database.count_active_users().await?;
        let total_products = database.count_products().await?;
        let total_articles = database.count_articles().await?;

        Ok(json_response(
            StatusCode::OK,
            json!({
                "totalUsers": total_users,
                "totalProducts": total_products,
                "totalArticles": total_articles
            }),
        ))
    }

    /// Handle GET /api/admin/users - active users, newest first
    async fn handle_list_users(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        Self::require_admin(&resources, &headers).await?;
        let users = resources.database.list_active_users().await?;
        let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
        Ok(Json(users).into_response())
    }

    /// Handle GET /api/admin/users/trash - soft deleted users, most recently deleted first
    async fn handle_list_trash(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        Self::require_admin(&resources, &headers).await?;
        let users = resources.database.list_deleted_users().await?;
        let users: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();
        Ok(Json(users).into_response())
    }

    /// Handle PUT /api/admin/users/:id/restore
    async fn handle_restore_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let admin = Self::require_admin(&resources, &headers).await?;

        let restored = match Uuid::parse_str(&id) {
            Ok(id) => resources.database.restore_user(id).await?,
            Err(_) => false,
        };
        if !restored {
            return Ok(msg_response(StatusCode::NOT_FOUND, messages::USER_NOT_FOUND));
        }

        AppLogger::log_admin_action("user_restored", &id.to_string(), &admin.id.to_string());
        Ok(msg_response(StatusCode::OK, messages::USER_RESTORED))
    }

    /// Handle DELETE /api/admin/users/:id - soft delete, never for administrators
    async fn handle_soft_delete_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let admin = Self::require_admin(&resources, &headers).await?;

        let target = match Uuid::parse_str(&id) {
            Ok(id) => resources.database.get_user(id).await?,
            Err(_) => None,
        };
        let Some(target) = target else {
            return Ok(msg_response(StatusCode::NOT_FOUND, messages::USER_NOT_FOUND));
        };
        if target.role.is_admin() {
            return Ok(msg_response(
                StatusCode::FORBIDDEN,
                messages::CANNOT_DELETE_ADMIN,
            ));
        }

        resources
            .database
            .soft_delete_user(target.id, Utc::now())
            .await?;

        AppLogger::log_admin_action(
            "user_soft_deleted",
            &target.id.to_string(),
            &admin.id.to_string(),
        );
        Ok(msg_response(StatusCode::OK, messages::USER_DEACTIVATED))
    }

    /// Handle DELETE /api/admin/users/:id/permanent
    async fn handle_purge_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let admin = Self::require_admin(&resources, &headers).await?;

        let deleted = match Uuid::parse_str(&id) {
            Ok(id) => resources.database.delete_user(id).await?,
            Err(_) => false,
        };
        if !deleted {
            return Ok(json_response(
                StatusCode::NOT_FOUND,
                json!({ "success": false, "msg": messages::USER_NOT_FOUND }),
            ));
        }

        AppLogger::log_admin_action("user_purged", &id.to_string(), &admin.id.to_string());
        Ok(json_response(
            StatusCode::OK,
            json!({ "success": true, "msg": messages::USER_PURGED }),
        ))
    }
}
