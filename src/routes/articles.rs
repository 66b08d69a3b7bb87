// ABOUTME: Health news route handler backed by NewsAPI with a local article cache
// ABOUTME: Passes NewsAPI key and rate limit failures through with the bodies the client expects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use super::json_response;
use crate::constants::{limits, messages};
use crate::errors::AppError;
use crate::external::NewsError;
use crate::logging::AppLogger;
use crate::server::ServerResources;
use crate::services::fetch_health_articles;

/// Health news routes
pub struct ArticleRoutes;

impl ArticleRoutes {
    /// Create all article routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/articles/health", get(Self::handle_health_articles))
            .with_state(resources)
    }

    /// Handle GET /api/articles/health
    ///
    /// Fresh articles are cached; when every query comes back empty the
    /// cached articles are served instead.
    async fn handle_health_articles(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let started = Instant::now();
        let fetched = fetch_health_articles(resources.news_source.as_ref()).await;
        AppLogger::log_external_call(
            "newsapi",
            "health_articles",
            fetched.is_ok(),
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );

        let articles = match fetched {
            Ok(articles) => articles,
            Err(e) => return Ok(Self::news_error_response(&e)),
        };

        if articles.is_empty() {
            let cached = resources
                .database
                .list_recent_articles(i64::from(limits::NEWS_PAGE_SIZE))
                .await?;
            info!(count = cached.len(), "No fresh health articles, serving cache");
            return Ok(Json(cached).into_response());
        }

        match resources
            .database
            .upsert_articles(&articles, Utc::now())
            .await
        {
            Ok(0) => {}
            Ok(pruned) => debug!(pruned, "Dropped stale cached articles"),
            Err(e) => warn!("Failed to cache health articles: {e}"),
        }

        info!(count = articles.len(), "Health articles fetched");
        Ok(Json(articles).into_response())
    }

    fn news_error_response(error: &NewsError) -> Response {
        warn!("Health article fetch failed: {error}");
        match error {
            NewsError::MissingKey => json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "API key not configured",
                    "message": messages::NEWS_KEY_MISSING
                }),
            ),
            NewsError::Unauthorized => json_response(
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "Invalid API Key",
                    "message": messages::NEWS_KEY_INVALID
                }),
            ),
            NewsError::RateLimited => json_response(
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": "Rate Limit Exceeded",
                    "message": messages::NEWS_RATE_LIMITED
                }),
            ),
            NewsError::Failed(details) => json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Server Error",
                    "message": messages::NEWS_FAILED,
                    "details": details
                }),
            ),
        }
    }
}
