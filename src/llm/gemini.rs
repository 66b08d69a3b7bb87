// ABOUTME: Google Gemini provider calling generateContent for text and image prompts
// ABOUTME: Maps quota, key and upstream failures onto application error codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Gemini Provider
//!
//! Set `GEMINI_API_KEY` with a key from Google AI Studio. Without a key the
//! server runs with no generative model: product analysis uses the heuristic,
//! and photo analysis and the chatbot answer with errors.
//!
//! `GENERATIVE_MODEL` names the analysis and photo model, `CHATBOT_MODEL` the
//! chatbot model. Requests always name one of the two.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::iter;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, MessageRole, ModelFeatures};
use crate::constants::defaults;
use crate::errors::{AppError, ErrorCode};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const SERVICE: &str = "gemini";

/// Finish reason Gemini reports when the output token limit cut the answer
const MAX_TOKENS_FINISH: &str = "MAX_TOKENS";

/// Gemini provider configuration
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    /// Model for requests that do not name one
    pub model: String,
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Configuration for an API key with default settings
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: API_BASE_URL.to_owned(),
            model: defaults::GENERATIVE_MODEL.to_owned(),
            timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Debug for GeminiConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    Image {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

// ============================================================================
// Provider
// ============================================================================

/// Google Gemini provider
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Create a provider with its own HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: GeminiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{model}:generateContent?key={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_key
        )
    }

    fn to_content(message: &ChatMessage) -> Content {
        let role = match message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "model",
        };
        let text = Part::Text {
            text: message.content.clone(),
        };
        let images = message.images.iter().map(|image| Part::Image {
            inline_data: Blob {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        });

        Content {
            role: Some(role.to_owned()),
            parts: iter::once(text).chain(images).collect(),
        }
    }

    fn to_wire(request: &ChatRequest) -> GenerateRequest {
        let tuned = request.temperature.is_some() || request.max_tokens.is_some();
        GenerateRequest {
            contents: request.messages.iter().map(Self::to_content).collect(),
            generation_config: tuned.then(|| GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            }),
        }
    }

    /// Text of the first candidate and whether it was cut off
    fn first_answer(response: &GenerateResponse) -> Result<(String, bool), AppError> {
        let Some(candidate) = response.candidates.first() else {
            return Err(AppError::external_service(SERVICE, "response has no candidates"));
        };

        let text: String = candidate
            .content
            .iter()
            .flat_map(|content| &content.parts)
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                Part::Image { .. } => None,
            })
            .collect();
        if text.is_empty() {
            return Err(AppError::external_service(SERVICE, "response has no text"));
        }

        let truncated = candidate.finish_reason.as_deref() == Some(MAX_TOKENS_FINISH);
        Ok((text, truncated))
    }

    fn map_api_error(status: u16, body: &str) -> AppError {
        let message = serde_json::from_str::<GenerateResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| body.to_owned(), |e| e.message);

        match status {
            429 => AppError::new(ErrorCode::ExternalRateLimited, quota_message(&message)),
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("{SERVICE}: API key rejected: {message}"),
            ),
            _ => AppError::external_service(SERVICE, format!("HTTP {status}: {message}")),
        }
    }
}

/// Quota message with the retry delay Gemini suggests, rounded up to seconds
fn quota_message(upstream: &str) -> String {
    let retry_secs = upstream
        .split_once("retry in ")
        .and_then(|(_, rest)| rest.split_once('s'))
        .and_then(|(number, _)| number.trim().parse::<f64>().ok())
        .map(f64::ceil);

    match retry_secs {
        Some(secs) => format!("AI quota exceeded, try again in {secs} seconds"),
        None => "AI quota exceeded, try again shortly".to_owned(),
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn features(&self) -> ModelFeatures {
        ModelFeatures::all()
    }

    #[instrument(skip_all, fields(model = %request.model.as_deref().unwrap_or(&self.config.model)))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.as_deref().unwrap_or(&self.config.model);

        // The URL carries the API key, keep it out of error messages
        let response = self
            .client
            .post(self.endpoint(model))
            .json(&Self::to_wire(request))
            .send()
            .await
            .map_err(|e| AppError::from(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::from(e.without_url()))?;

        if !status.is_success() {
            error!(%status, "Gemini request failed");
            return Err(Self::map_api_error(status.as_u16(), &body));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service(SERVICE, format!("unreadable response: {e}"))
        })?;
        if let Some(api_error) = parsed.error.as_ref() {
            return Err(AppError::external_service(SERVICE, api_error.message.clone()));
        }

        let (content, truncated) = Self::first_answer(&parsed)?;
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count.unwrap_or(0),
                output_tokens = usage.candidates_token_count.unwrap_or(0),
                "Gemini answered"
            );
        }
        if truncated {
            warn!("Gemini answer hit the output token limit");
        }

        Ok(ChatResponse {
            content,
            model: model.to_owned(),
            truncated,
        })
    }
}

impl Debug for GeminiProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::InlineImage;

    #[test]
    fn test_wire_request_carries_roles_images_and_limits() {
        let request = ChatRequest::new(vec![
            ChatMessage::user("Kamu ahli gizi"),
            ChatMessage::assistant("Siap"),
            ChatMessage::user("Apa ini?").with_image(InlineImage {
                mime_type: "image/jpeg".to_owned(),
                data: "AAAA".to_owned(),
            }),
        ])
        .with_max_tokens(100);

        let value = serde_json::to_value(GeminiProvider::to_wire(&request)).unwrap();
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["contents"][2]["parts"][0]["text"], "Apa ini?");
        assert_eq!(
            value["contents"][2]["parts"][1]["inlineData"]["mimeType"],
            "image/jpeg"
        );
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 100);
        assert!(value["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn test_untuned_request_has_no_generation_config() {
        let request = ChatRequest::new(vec![ChatMessage::user("hai")]);
        let value = serde_json::to_value(GeminiProvider::to_wire(&request)).unwrap();
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn test_rate_limit_keeps_retry_hint() {
        let body = r#"{"error":{"message":"Quota exceeded. Please retry in 6.4s."}}"#;
        let err = GeminiProvider::map_api_error(429, body);
        assert_eq!(err.code, ErrorCode::ExternalRateLimited);
        assert!(err.message.contains("7 seconds"));

        let err = GeminiProvider::map_api_error(429, "slow down");
        assert!(err.message.ends_with("try again shortly"));
    }

    #[test]
    fn test_key_and_server_errors() {
        let err = GeminiProvider::map_api_error(403, "{}");
        assert_eq!(err.code, ErrorCode::ExternalAuthFailed);

        let err = GeminiProvider::map_api_error(500, "boom");
        assert_eq!(err.code, ErrorCode::ExternalServiceError);
        assert!(err.message.contains("HTTP 500: boom"));
    }

    #[test]
    fn test_text_parts_are_joined_and_truncation_flagged() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"a\":"},{"text":"1}"}]},"finishReason":"MAX_TOKENS"}]}"#,
        )
        .unwrap();
        let (text, truncated) = GeminiProvider::first_answer(&response).unwrap();
        assert_eq!(text, "{\"a\":1}");
        assert!(truncated);

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(GeminiProvider::first_answer(&empty).is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let provider = GeminiProvider::new(GeminiConfig::new("secret-key")).unwrap();
        assert!(!format!("{provider:?}").contains("secret-key"));
    }
}
