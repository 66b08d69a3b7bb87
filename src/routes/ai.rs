// ABOUTME: Food photo analysis route handler using a two-step vision then nutrition prompt
// ABOUTME: Describes the photo with the vision model and asks for a strict JSON nutrition estimate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::json_response;
use crate::errors::{AppError, AppResult};
use crate::llm::prompts::{nutrition_estimate_prompt, FOOD_VISION_PROMPT};
use crate::llm::{ChatMessage, ChatRequest, InlineImage, LlmProvider, ModelFeatures};
use crate::middleware::authenticate;
use crate::server::ServerResources;

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// `POST /api/ai/analyze-image` body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    #[serde(default)]
    pub image_data: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Food photo analysis routes
pub struct AiRoutes;

impl AiRoutes {
    /// Create all AI routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/ai/analyze-image", post(Self::handle_analyze_image))
            .with_state(resources)
    }

    /// Handle POST /api/ai/analyze-image
    async fn handle_analyze_image(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<AnalyzeImageRequest>,
    ) -> Result<Response, AppError> {
        let auth = authenticate(&headers, &resources).await?;

        let image_data = request.image_data.trim();
        if image_data.is_empty() || STANDARD.decode(image_data).is_err() {
            return Err(AppError::invalid_input(
                "imageData must be a base64 encoded image",
            ));
        }

        let Some(provider) = resources.llm() else {
            return Err(AppError::external_unavailable(
                "gemini",
                "Generative model is not configured",
            ));
        };
        if !provider.features().supports(ModelFeatures::IMAGE_INPUT) {
            return Err(AppError::external_unavailable(
                provider.name(),
                "Generative model cannot read images",
            ));
        }

        let image = InlineImage {
            mime_type: request
                .mime_type
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_owned()),
            data: image_data.to_owned(),
        };
        let model = &resources.config.external_services.generative.analysis_model;

        match estimate_from_photo(provider, model, image).await {
            Ok(estimate) => {
                info!(user_id = %auth.user_id, "Food photo analyzed");
                Ok(Json(estimate).into_response())
            }
            Err(e) => {
                warn!(user_id = %auth.user_id, "Food photo analysis failed: {e}");
                Ok(json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Server Error", "details": e.to_string() }),
                ))
            }
        }
    }
}

/// Describe the photo, then estimate its nutrition from the description
async fn estimate_from_photo(
    provider: &dyn LlmProvider,
    model: &str,
    image: InlineImage,
) -> AppResult<Value> {
    let vision = ChatRequest::new(vec![
        ChatMessage::user(FOOD_VISION_PROMPT).with_image(image)
    ])
    .with_model(model);
    let description = provider.complete(&vision).await?.content;

    let estimate = ChatRequest::new(vec![ChatMessage::user(nutrition_estimate_prompt(
        &description,
    ))])
    .with_model(model);
    let answer = provider.complete(&estimate).await?.content;

    parse_estimate(&answer)
}

/// Strip Markdown code fences and parse the estimate as JSON
fn parse_estimate(answer: &str) -> AppResult<Value> {
    let cleaned = answer.replace("```json", "").replace("```", "");
    Ok(serde_json::from_str(cleaned.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_estimate_strips_fences() {
        let answer = "```json\n{\"description\":\"Nasi goreng\",\"calories\":350}\n```";
        let value = parse_estimate(answer).unwrap();
        assert_eq!(value["description"], "Nasi goreng");
        assert_eq!(value["calories"], 350);
    }

    #[test]
    fn test_parse_estimate_rejects_prose() {
        assert!(parse_estimate("Maaf, saya tidak bisa melihat gambar.").is_err());
    }
}
