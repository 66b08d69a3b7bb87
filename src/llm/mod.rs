// ABOUTME: LLM provider abstraction layer for pluggable AI model integration
// ABOUTME: Defines the contract for providers (Gemini, scripted test double) with image input
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Generative Models
//!
//! Food analysis, meal photo estimates and the chatbot all go through
//! [`LlmProvider`]. Gemini is the production provider; the scripted provider
//! replays canned answers in tests.
//!
//! Prompts are plain user turns. The chatbot primes the conversation with its
//! instructions followed by a model reply instead of a system message.
//!
//! ```rust,no_run
//! use scanbar_server::llm::{ChatMessage, ChatRequest, LlmProvider};
//!
//! async fn example(provider: &dyn LlmProvider) {
//!     let request = ChatRequest::new(vec![ChatMessage::user(
//!         "Berapa kalori satu porsi nasi goreng?",
//!     )])
//!     .with_max_tokens(500);
//!     let answer = provider.complete(&request).await;
//! }
//! ```

mod gemini;
pub mod prompts;
mod scripted;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use scripted::ScriptedLlmProvider;

use async_trait::async_trait;

use crate::errors::AppError;

bitflags::bitflags! {
    /// Inputs a provider can handle
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ModelFeatures: u8 {
        /// Inline image parts in user turns
        const IMAGE_INPUT = 0b01;
        /// Earlier user and model turns in the same request
        const MULTI_TURN = 0b10;
    }
}

impl ModelFeatures {
    /// Check whether every feature in `required` is present
    #[must_use]
    pub const fn supports(self, required: Self) -> bool {
        self.contains(required)
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// The app or its user
    User,
    /// The model
    Assistant,
}

/// Base64 image data sent alongside a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    /// MIME type such as `image/jpeg`
    pub mime_type: String,
    /// Standard base64 encoded bytes
    pub data: String,
}

/// One conversation turn
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Images sent after the text
    pub images: Vec<InlineImage>,
}

impl ChatMessage {
    fn turn(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            images: Vec::new(),
        }
    }

    /// User turn
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::turn(MessageRole::User, content)
    }

    /// Model turn
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::turn(MessageRole::Assistant, content)
    }

    /// Attach an inline image
    #[must_use]
    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.images.push(image);
        self
    }
}

/// A completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Model name, provider default when absent
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Request with provider defaults
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Features a provider needs to serve this request
    #[must_use]
    pub fn required_features(&self) -> ModelFeatures {
        let mut features = ModelFeatures::empty();
        if self.messages.iter().any(|m| !m.images.is_empty()) {
            features |= ModelFeatures::IMAGE_INPUT;
        }
        if self.messages.len() > 1 {
            features |= ModelFeatures::MULTI_TURN;
        }
        features
    }
}

/// Model answer
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Concatenated text parts
    pub content: String,
    /// Model that produced the answer
    pub model: String,
    /// The answer hit the output token limit
    pub truncated: bool,
}

/// Generative model backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier used in logs and error messages
    fn name(&self) -> &'static str;

    /// Inputs this provider accepts
    fn features(&self) -> ModelFeatures;

    /// Run one completion
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError>;
}

/// Reject a request the provider cannot handle
///
/// # Errors
///
/// Returns an external-service-unavailable error naming the provider
pub fn ensure_supported(provider: &dyn LlmProvider, request: &ChatRequest) -> Result<(), AppError> {
    let missing = request.required_features().difference(provider.features());
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::external_unavailable(
            provider.name(),
            format!("model does not support {missing:?}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo() -> InlineImage {
        InlineImage {
            mime_type: "image/png".to_owned(),
            data: "aGFp".to_owned(),
        }
    }

    #[test]
    fn test_required_features() {
        let single = ChatRequest::new(vec![ChatMessage::user("hai")]);
        assert!(single.required_features().is_empty());

        let with_photo = ChatRequest::new(vec![ChatMessage::user("apa ini?").with_image(photo())]);
        assert_eq!(with_photo.required_features(), ModelFeatures::IMAGE_INPUT);

        let conversation = ChatRequest::new(vec![
            ChatMessage::user("hai"),
            ChatMessage::assistant("halo"),
            ChatMessage::user("resep sup?"),
        ]);
        assert!(conversation
            .required_features()
            .supports(ModelFeatures::MULTI_TURN));
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("hai")])
            .with_model("gemini-2.5-flash-lite")
            .with_temperature(0.7)
            .with_max_tokens(1000);

        assert_eq!(request.model.as_deref(), Some("gemini-2.5-flash-lite"));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(1000));
    }
}
