// ABOUTME: Account route handlers for registration, email verification, login and password reset
// ABOUTME: Also serves the signed-in user's profile and nutrition goals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Account routes
//!
//! Verification and reset links are never mailed; they are written to the
//! log through [`AppLogger::log_outbound_email`] so an operator can hand
//! them over.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{lenient_number, message_response, non_empty_string};
use crate::auth::{generate_token_hex, hash_password, sha256_hex, verify_password};
use crate::constants::{limits, messages};
use crate::database::ProfileUpdate;
use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::middleware::authenticate;
use crate::models::User;
use crate::server::ServerResources;

/// User as returned to clients, without secrets
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub age: Option<u32>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub daily_calorie_goal: f64,
    pub daily_protein_goal: f64,
    pub daily_carbs_goal: f64,
    pub daily_fat_goal: f64,
    pub daily_sugar_goal: f64,
    pub daily_salt_goal: f64,
    pub is_verified: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
            weight: user.weight,
            height: user.height,
            daily_calorie_goal: user.goals.calories,
            daily_protein_goal: user.goals.protein,
            daily_carbs_goal: user.goals.carbs,
            daily_fat_goal: user.goals.fat,
            daily_sugar_goal: user.goals.sugar,
            daily_salt_goal: user.goals.salt,
            is_verified: user.is_verified,
            role: user.role.as_str().to_owned(),
            created_at: user.created_at,
            deleted_at: user.deleted_at,
        }
    }
}

/// `POST /api/users/register` body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "non_empty_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "non_empty_string")]
    pub password: Option<String>,
}

/// `POST /api/users/login` body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// `POST /api/users/forgotpassword` body
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// `PUT /api/users/resetpassword/:token` body
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default, deserialize_with = "non_empty_string")]
    pub password: Option<String>,
}

/// Goal fields shared by `PUT /goals` and `PUT /profile`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalsRequest {
    #[serde(default, deserialize_with = "lenient_number")]
    pub daily_calorie_goal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub daily_protein_goal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub daily_carbs_goal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub daily_fat_goal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub daily_sugar_goal: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub daily_salt_goal: Option<f64>,
}

/// `PUT /api/users/profile` body
#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    #[serde(default, deserialize_with = "non_empty_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub age: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub height: Option<f64>,
    #[serde(flatten)]
    pub goals: GoalsRequest,
}

impl ProfileRequest {
    /// Name, age, weight and height only count when truthy; goals count when present
    fn into_update(self) -> ProfileUpdate {
        let positive = |v: Option<f64>| v.filter(|v| *v > 0.0);
        ProfileUpdate {
            name: self.name,
            age: positive(self.age).map(|a| a.round() as u32),
            weight: positive(self.weight),
            height: positive(self.height),
            goal_calories: self.goals.daily_calorie_goal,
            goal_protein: self.goals.daily_protein_goal,
            goal_carbs: self.goals.daily_carbs_goal,
            goal_fat: self.goals.daily_fat_goal,
            goal_sugar: self.goals.daily_sugar_goal,
            goal_salt: self.goals.daily_salt_goal,
        }
    }
}

/// Account routes
pub struct UserRoutes;

impl UserRoutes {
    /// Create all account routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/users/register", post(Self::handle_register))
            .route(
                "/api/users/verifyemail/:token",
                get(Self::handle_verify_email),
            )
            .route("/api/users/login", post(Self::handle_login))
            .route("/api/users/goals", put(Self::handle_update_goals))
            .route(
                "/api/users/forgotpassword",
                post(Self::handle_forgot_password),
            )
            .route(
                "/api/users/resetpassword/:token",
                put(Self::handle_reset_password),
            )
            .route(
                "/api/users/profile",
                get(Self::handle_get_profile).put(Self::handle_update_profile),
            )
            .with_state(resources)
    }

    /// Handle POST /api/users/register
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let (Some(name), Some(email), Some(password)) =
            (request.name, request.email, request.password)
        else {
            return Ok(message_response(
                StatusCode::BAD_REQUEST,
                messages::REGISTER_FIELDS_REQUIRED,
            ));
        };
        let email = email.trim().to_owned();

        if resources.database.get_user_by_email(&email).await?.is_some() {
            return Ok(message_response(
                StatusCode::BAD_REQUEST,
                messages::EMAIL_TAKEN,
            ));
        }

        let verification_token = generate_token_hex();
        let mut user = User::new(
            name.trim().to_owned(),
            email,
            hash_password(password).await?,
        );
        user.verification_token_hash = Some(sha256_hex(&verification_token));
        resources.database.create_user(&user).await?;

        let link = format!(
            "{}/api/users/verifyemail/{verification_token}",
            resources.config.links.public_base_url.trim_end_matches('/')
        );
        AppLogger::log_outbound_email("verification", &user.email, &link);
        info!(user_id = %user.id, "User registered");

        Ok(message_response(StatusCode::CREATED, messages::REGISTERED))
    }

    /// Handle GET /api/users/verifyemail/:token
    async fn handle_verify_email(
        State(resources): State<Arc<ServerResources>>,
        Path(token): Path<String>,
    ) -> Result<Response, AppError> {
        let Some(user) = resources
            .database
            .get_user_by_verification_hash(&sha256_hex(&token))
            .await?
        else {
            return Ok((StatusCode::BAD_REQUEST, Html(messages::VERIFY_FAILED_HTML)).into_response());
        };

        resources.database.mark_user_verified(user.id).await?;
        AppLogger::log_auth_event(&user.id.to_string(), "email_verified", true, None);

        Ok((StatusCode::OK, Html(messages::VERIFY_OK_HTML)).into_response())
    }

    /// Handle POST /api/users/login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let user = resources
            .database
            .get_user_by_email(request.email.trim())
            .await?
            .filter(|user| !user.is_deleted());

        let Some(user) = user else {
            AppLogger::log_auth_event("unknown", "login", false, Some("unknown email"));
            return Ok(message_response(
                StatusCode::BAD_REQUEST,
                messages::BAD_CREDENTIALS,
            ));
        };

        if !verify_password(request.password, user.password_hash.clone()).await {
            AppLogger::log_auth_event(&user.id.to_string(), "login", false, Some("bad password"));
            return Ok(message_response(
                StatusCode::BAD_REQUEST,
                messages::BAD_CREDENTIALS,
            ));
        }

        if !user.is_verified {
            return Ok(message_response(
                StatusCode::UNAUTHORIZED,
                messages::NOT_VERIFIED,
            ));
        }

        let token = resources.auth_manager.generate_token(&user)?;
        AppLogger::log_auth_event(&user.id.to_string(), "login", true, None);

        Ok(Json(LoginResponse {
            token,
            user: UserResponse::from(&user),
        })
        .into_response())
    }

    /// Handle PUT /api/users/goals
    ///
    /// Calorie, protein, carbohydrate and fat goals are always written (absent
    /// means 0); sugar and salt only when sent.
    async fn handle_update_goals(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(goals): Json<GoalsRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;

        let update = ProfileUpdate {
            goal_calories: Some(goals.daily_calorie_goal.unwrap_or(0.0)),
            goal_protein: Some(goals.daily_protein_goal.unwrap_or(0.0)),
            goal_carbs: Some(goals.daily_carbs_goal.unwrap_or(0.0)),
            goal_fat: Some(goals.daily_fat_goal.unwrap_or(0.0)),
            goal_sugar: goals.daily_sugar_goal,
            goal_salt: goals.daily_salt_goal,
            ..ProfileUpdate::default()
        };

        Self::apply_update(&resources, auth.user_id, &update).await
    }

    /// Handle POST /api/users/forgotpassword
    ///
    /// Answers the same way whether or not the email is registered.
    async fn handle_forgot_password(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<ForgotPasswordRequest>,
    ) -> Result<Response, AppError> {
        if let Some(user) = resources
            .database
            .get_user_by_email(request.email.trim())
            .await?
        {
            let reset_token = generate_token_hex();
            let expires_at = Utc::now() + Duration::minutes(limits::RESET_TOKEN_TTL_MINUTES);
            resources
                .database
                .set_reset_token(user.id, &sha256_hex(&reset_token), expires_at)
                .await?;

            let link = format!(
                "{}/resetpassword/{reset_token}",
                resources.config.links.frontend_base_url.trim_end_matches('/')
            );
            AppLogger::log_outbound_email("password_reset", &user.email, &link);
        }

        Ok(message_response(StatusCode::OK, messages::RESET_LINK_SENT))
    }

    /// Handle PUT /api/users/resetpassword/:token
    async fn handle_reset_password(
        State(resources): State<Arc<ServerResources>>,
        Path(token): Path<String>,
        Json(request): Json<ResetPasswordRequest>,
    ) -> Result<Response, AppError> {
        let Some(user) = resources
            .database
            .get_user_by_reset_token(&sha256_hex(&token), Utc::now())
            .await?
        else {
            return Ok(message_response(
                StatusCode::BAD_REQUEST,
                messages::RESET_TOKEN_INVALID,
            ));
        };

        let Some(password) = request.password else {
            return Ok(message_response(
                StatusCode::BAD_REQUEST,
                messages::PASSWORD_REQUIRED,
            ));
        };

        let password_hash = hash_password(password).await?;
        resources
            .database
            .reset_password(user.id, &password_hash)
            .await?;
        AppLogger::log_auth_event(&user.id.to_string(), "password_reset", true, None);

        Ok(message_response(StatusCode::OK, messages::PASSWORD_CHANGED))
    }

    /// Handle GET /api/users/profile
    async fn handle_get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;

        match resources.database.get_user(auth.user_id).await? {
            Some(user) => Ok(Json(UserResponse::from(&user)).into_response()),
            None => Ok(message_response(
                StatusCode::NOT_FOUND,
                messages::USER_NOT_FOUND,
            )),
        }
    }

    /// Handle PUT /api/users/profile
    async fn handle_update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ProfileRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;
        Self::apply_update(&resources, auth.user_id, &request.into_update()).await
    }

    async fn apply_update(
        resources: &ServerResources,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Response, AppError> {
        if !resources
            .database
            .update_user_profile(user_id, update)
            .await?
        {
            return Ok(message_response(
                StatusCode::NOT_FOUND,
                messages::USER_NOT_FOUND,
            ));
        }

        match resources.database.get_user(user_id).await? {
            Some(user) => Ok(Json(UserResponse::from(&user)).into_response()),
            None => Ok(message_response(
                StatusCode::NOT_FOUND,
                messages::USER_NOT_FOUND,
            )),
        }
    }
}
