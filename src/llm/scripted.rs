// ABOUTME: Scripted LLM provider that replays queued answers without network access
// ABOUTME: Records every request so tests can assert on prompts, models and images
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, LlmProvider, ModelFeatures};
use crate::errors::{AppError, ErrorCode};

const SCRIPTED_MODEL: &str = "scripted-model";

/// Provider returning queued responses in order
///
/// An exhausted queue answers with an external service error.
pub struct ScriptedLlmProvider {
    answers: Mutex<VecDeque<Result<String, AppError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    features: ModelFeatures,
}

impl ScriptedLlmProvider {
    /// Provider with an empty script that accepts every input
    #[must_use]
    pub fn new() -> Self {
        Self {
            answers: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            features: ModelFeatures::all(),
        }
    }

    /// Queue a text answer
    #[must_use]
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn then_error(self, error: AppError) -> Self {
        self.push(Err(error));
        self
    }

    /// Advertise only the given features
    #[must_use]
    pub const fn with_features(mut self, features: ModelFeatures) -> Self {
        self.features = features;
        self
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn push(&self, answer: Result<String, AppError>) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.push_back(answer);
        }
    }
}

impl Default for ScriptedLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlmProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn features(&self) -> ModelFeatures {
        self.features
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let next = self
            .answers
            .lock()
            .map_err(|_| AppError::internal("Scripted provider lock poisoned"))?
            .pop_front();

        let content = match next {
            Some(answer) => answer?,
            None => {
                return Err(AppError::new(
                    ErrorCode::ExternalServiceError,
                    "Scripted provider has no answer left",
                ))
            }
        };

        Ok(ChatResponse {
            content,
            model: request
                .model
                .clone()
                .unwrap_or_else(|| SCRIPTED_MODEL.to_owned()),
            truncated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    #[tokio::test]
    async fn test_answers_in_order_then_fails() {
        let provider = ScriptedLlmProvider::new()
            .then_text("pertama")
            .then_error(AppError::external_service("Gemini", "down"));
        let request = ChatRequest::new(vec![ChatMessage::user("hai")]);

        assert_eq!(provider.complete(&request).await.unwrap().content, "pertama");
        assert!(provider.complete(&request).await.is_err());
        assert!(provider.complete(&request).await.is_err());
        assert_eq!(provider.requests().len(), 3);
    }
}
