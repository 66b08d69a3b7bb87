// ABOUTME: Food journal route handlers for entries, summaries and per-product AI analysis
// ABOUTME: Includes the legacy Open Food Facts v2 barcode lookup used by the manual entry form
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Food journal routes
//!
//! "Today", "this week" and "this month" are computed with the server's
//! [`JournalCalendar`](crate::nutrition::JournalCalendar).

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::{json_response, lenient_number, message_response, msg_response, non_empty_string};
use crate::constants::messages;
use crate::errors::AppError;
use crate::middleware::{authenticate, authenticate_optional};
use crate::models::FoodEntry;
use crate::nutrition::barcode;
use crate::nutrition::summary::{nutrition_summary, period_summary};
use crate::nutrition::{HeuristicInput, SummaryPeriod};
use crate::server::ServerResources;
use crate::services::{analyze, AnalysisOutcome};

/// `POST /api/foods` body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoodRequest {
    #[serde(default, deserialize_with = "non_empty_string")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub calories: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub protein: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub carbs: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sugar: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub salt: Option<f64>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub image_url: Option<String>,
}

/// `POST /api/foods/analyze` body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default, deserialize_with = "non_empty_string")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub calories: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub protein: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub carbs: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub fat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sugar: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub salt: Option<f64>,
}

impl From<AnalyzeRequest> for HeuristicInput {
    fn from(request: AnalyzeRequest) -> Self {
        Self {
            product_name: request.product_name.unwrap_or_default(),
            calories: request.calories.unwrap_or(0.0),
            protein: request.protein.unwrap_or(0.0),
            carbs: request.carbs.unwrap_or(0.0),
            fat: request.fat.unwrap_or(0.0),
            sugar: request.sugar.unwrap_or(0.0),
            salt: request.salt.unwrap_or(0.0),
        }
    }
}

/// `GET /api/foods/summary` query
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub period: Option<String>,
}

/// Legacy barcode lookup result for the manual entry form
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeFood {
    pub product_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub image_url: String,
    pub barcode: String,
}

/// Analysis stored for today
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnalysisResponse {
    pub date: NaiveDate,
    pub analysis: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Food journal routes
pub struct FoodRoutes;

impl FoodRoutes {
    /// Create all food journal routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/foods",
                post(Self::handle_create).get(Self::handle_list_today),
            )
            .route("/api/foods/barcode/:barcode", get(Self::handle_barcode))
            .route("/api/foods/summary", get(Self::handle_summary))
            .route("/api/foods/analyze", post(Self::handle_analyze))
            .route("/api/foods/analyze-test", post(Self::handle_analyze_test))
            .route("/api/foods/daily-analysis", get(Self::handle_daily_analysis))
            .route("/api/foods/:id", delete(Self::handle_delete))
            .with_state(resources)
    }

    /// Handle POST /api/foods
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateFoodRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;

        let Some(product_name) = request.product_name else {
            return Ok(msg_response(
                StatusCode::BAD_REQUEST,
                messages::FOOD_NAME_REQUIRED,
            ));
        };

        let entry = FoodEntry {
            id: Uuid::new_v4(),
            user_id: auth.user_id,
            product_name,
            calories: request.calories.unwrap_or(0.0),
            protein: request.protein.unwrap_or(0.0),
            carbs: request.carbs.unwrap_or(0.0),
            fat: request.fat.unwrap_or(0.0),
            sugar: request.sugar.unwrap_or(0.0),
            salt: request.salt.unwrap_or(0.0),
            barcode: request.barcode,
            image_url: request.image_url,
            date: Utc::now(),
        };
        resources.database.create_food_entry(&entry).await?;

        Ok(Json(entry).into_response())
    }

    /// Handle GET /api/foods - today's entries, newest first
    async fn handle_list_today(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let today = resources.calendar().day(Utc::now());

        let entries = resources
            .database
            .list_food_entries(auth.user_id, today.start, today.end)
            .await?;

        Ok(Json(entries).into_response())
    }

    /// Handle GET /api/foods/barcode/:barcode
    async fn handle_barcode(
        State(resources): State<Arc<ServerResources>>,
        Path(raw_barcode): Path<String>,
    ) -> Result<Response, AppError> {
        let barcode = barcode::normalize(&raw_barcode);
        if barcode.is_empty() {
            return Ok(message_response(
                StatusCode::BAD_REQUEST,
                messages::BARCODE_INVALID,
            ));
        }

        let product = match resources.product_catalog.fetch_product_v2(&barcode).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                return Ok(message_response(
                    StatusCode::NOT_FOUND,
                    messages::OFF_PRODUCT_NOT_FOUND,
                ))
            }
            Err(e) => {
                warn!(barcode = %barcode, "Open Food Facts v2 lookup failed: {e}");
                return Ok(message_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    messages::BARCODE_LOOKUP_FAILED,
                ));
            }
        };

        let nutrient = |key: &str| product.nutriments.number(key).unwrap_or(0.0);
        Ok(Json(BarcodeFood {
            product_name: product
                .product_name
                .clone()
                .unwrap_or_else(|| messages::NAME_UNAVAILABLE.to_owned()),
            calories: nutrient("energy-kcal_100g"),
            protein: nutrient("proteins_100g"),
            carbs: nutrient("carbohydrates_100g"),
            fat: nutrient("fat_100g"),
            image_url: product.image_url.clone().unwrap_or_default(),
            barcode,
        })
        .into_response())
    }

    /// Handle DELETE /api/foods/:id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;

        let entry = match Uuid::parse_str(&id) {
            Ok(id) => resources.database.get_food_entry(id).await?,
            Err(_) => None,
        };
        let Some(entry) = entry else {
            return Ok(msg_response(StatusCode::NOT_FOUND, messages::FOOD_NOT_FOUND));
        };

        if entry.user_id != auth.user_id {
            return Ok(msg_response(
                StatusCode::UNAUTHORIZED,
                messages::FOOD_NOT_OWNED,
            ));
        }

        resources.database.delete_food_entry(entry.id).await?;
        Ok(msg_response(StatusCode::OK, messages::FOOD_DELETED))
    }

    /// Handle GET /api/foods/summary
    ///
    /// Without `period` returns today's totals with weekly and monthly daily
    /// averages; with it returns totals for that period.
    async fn handle_summary(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<SummaryQuery>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let calendar = resources.calendar();
        let now = Utc::now();

        match query.period.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(period) => {
                let period: SummaryPeriod = period.parse()?;
                let summary =
                    period_summary(&resources.database, &calendar, auth.user_id, period, now)
                        .await?;
                Ok(Json(summary).into_response())
            }
            None => {
                let summary =
                    nutrition_summary(&resources.database, &calendar, auth.user_id, now).await?;
                Ok(Json(summary).into_response())
            }
        }
    }

    /// Handle POST /api/foods/analyze - analysis stored as today's analysis
    async fn handle_analyze(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<AnalyzeRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let outcome = Self::run_analysis(&resources, request.into()).await;

        let now = Utc::now();
        let today = resources.calendar().local_date(now);
        let analysis_text = serde_json::to_string(&outcome.analysis)?;
        if let Err(e) = resources
            .database
            .upsert_daily_analysis(auth.user_id, today, &analysis_text, now)
            .await
        {
            warn!(user_id = %auth.user_id, "Failed to store daily analysis: {e}");
        }

        Ok(Json(json!({ "analysis": outcome.analysis })).into_response())
    }

    /// Handle POST /api/foods/analyze-test - same analysis without signing in
    ///
    /// Nothing is stored, even for a signed-in caller.
    async fn handle_analyze_test(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<AnalyzeRequest>,
    ) -> Result<Response, AppError> {
        let caller = authenticate_optional(&headers, &resources).await;
        let outcome = Self::run_analysis(&resources, request.into()).await;
        info!(guest = caller.is_none(), "Ran unsaved food analysis");
        Ok(Json(json!({ "analysis": outcome.analysis })).into_response())
    }

    /// Handle GET /api/foods/daily-analysis
    async fn handle_daily_analysis(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        let today = resources.calendar().local_date(Utc::now());

        let Some(stored) = resources
            .database
            .get_daily_analysis(auth.user_id, today)
            .await?
        else {
            return Ok(msg_response(
                StatusCode::NOT_FOUND,
                messages::ANALYSIS_NOT_FOUND,
            ));
        };

        let analysis = serde_json::from_str(&stored.analysis_text)
            .unwrap_or(Value::String(stored.analysis_text));

        Ok(json_response(
            StatusCode::OK,
            serde_json::to_value(DailyAnalysisResponse {
                date: stored.date,
                analysis,
                created_at: stored.created_at,
                updated_at: stored.updated_at,
            })?,
        ))
    }

    async fn run_analysis(resources: &ServerResources, input: HeuristicInput) -> AnalysisOutcome {
        let model = &resources.config.external_services.generative.analysis_model;
        let outcome = analyze(resources.llm(), model, &input).await;
        info!(
            product = %input.product_name,
            source = ?outcome.source,
            "Product analysis produced"
        );
        outcome
    }
}
