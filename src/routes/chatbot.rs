// ABOUTME: In-app assistant route handler with keyword quick replies and a model fallback
// ABOUTME: Navigation questions are answered locally, everything else goes to the chatbot model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Chatbot routes
//!
//! The assistant only talks about food, nutrition and the app itself. The
//! topic restriction lives in the system prompt; navigation questions never
//! reach the model.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::json_response;
use crate::constants::{limits, messages};
use crate::errors::{AppError, AppResult};
use crate::llm::prompts::{chatbot_system_prompt, navigation, CHATBOT_PRIMING_REPLY};
use crate::llm::{ensure_supported, ChatMessage, ChatRequest, LlmProvider};
use crate::middleware::authenticate_optional;
use crate::server::ServerResources;

/// One earlier turn sent back by the client
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// `POST /api/chatbot/chat` body
#[derive(Debug, Deserialize)]
pub struct ChatbotRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
}

/// Assistant answer
#[derive(Debug, Serialize)]
pub struct ChatbotResponse {
    pub response: String,
}

/// Canned answer for a navigation question, if the message is one
#[must_use]
pub fn quick_reply(message: &str) -> Option<String> {
    let lower = message.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("scan barcode") || (has("barcode") && has("dimana")) {
        return Some(format!(
            "**Cara Scan Barcode:**\n\n{}\n\nLangkah-langkah:\n1. Arahkan kamera ke barcode produk\n2. Tunggu hingga terdeteksi otomatis\n3. Info nutrisi akan muncul\n4. Tap \"Simpan ke Jurnal\" untuk mencatat\n\n Barcode biasanya ada di belakang atau samping kemasan produk.",
            navigation::SCAN_BARCODE
        ));
    }

    if has("scan makanan") || (has("foto makanan") && has("dimana")) {
        return Some(format!(
            "**Cara Scan Makanan:**\n\n{}\n\nLangkah-langkah:\n1. Arahkan kamera ke makanan\n2. Tap tombol \"Analisis\"\n3. AI akan deteksi jenis makanan dan nutrisinya\n4. Review hasilnya\n5. Tap \"Simpan ke Jurnal\"\n\n Pastikan pencahayaan cukup agar deteksi lebih akurat!",
            navigation::SCAN_FOOD
        ));
    }

    if has("bmi") || has("atur ulang") || has("edit target") || has("ubah target") {
        return Some(format!(
            "**Cara Atur Ulang BMI/Target Nutrisi:**\n\n{}\n\nYang perlu diisi:\n- Berat badan (kg)\n- Tinggi badan (cm)\n- Usia (tahun)\n- Jenis kelamin\n- Tingkat aktivitas\n\nSistem akan otomatis hitung target kalori dan nutrisi harian kamu. Tap \"Simpan\" jika sudah selesai!",
            navigation::EDIT_BMI
        ));
    }

    if has("jurnal") && has("dimana") {
        return Some(format!(
            "**Cara Lihat Jurnal Harian:**\n\n{}\n\nDi jurnal kamu bisa:\n- Lihat semua makanan yang sudah di-scan hari ini\n- Cek total kalori, protein, karbo, lemak, gula, garam\n- Bandingkan dengan target nutrisi harian\n- Hapus atau edit entri makanan",
            navigation::JOURNAL
        ));
    }

    None
}

/// Model conversation: system prompt, priming reply, recent history, new message
#[must_use]
pub fn build_conversation(message: &str, history: &[HistoryMessage]) -> Vec<ChatMessage> {
    let recent = &history[history.len().saturating_sub(limits::CHAT_HISTORY_WINDOW)..];

    let mut conversation = Vec::with_capacity(recent.len() + 3);
    conversation.push(ChatMessage::user(chatbot_system_prompt()));
    conversation.push(ChatMessage::assistant(CHATBOT_PRIMING_REPLY));
    conversation.extend(recent.iter().map(|turn| {
        if turn.role == "user" {
            ChatMessage::user(turn.content.clone())
        } else {
            ChatMessage::assistant(turn.content.clone())
        }
    }));
    conversation.push(ChatMessage::user(message));
    conversation
}

/// In-app assistant routes
pub struct ChatbotRoutes;

impl ChatbotRoutes {
    /// Create all chatbot routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chatbot/chat", post(Self::handle_chat))
            .with_state(resources)
    }

    /// Handle POST /api/chatbot/chat
    ///
    /// Guests may chat; a valid session only attributes the request.
    async fn handle_chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ChatbotRequest>,
    ) -> Response {
        let caller = authenticate_optional(&headers, &resources).await;
        let user_id = caller.map(|auth| auth.user_id.to_string());

        if let Some(reply) = quick_reply(&request.message) {
            debug!(
                user_id = user_id.as_deref().unwrap_or("guest"),
                "Answered chatbot message with a quick reply"
            );
            return Json(ChatbotResponse { response: reply }).into_response();
        }

        let model = &resources.config.external_services.generative.chatbot_model;
        match Self::ask_model(resources.llm(), model, &request).await {
            Ok(response) => Json(ChatbotResponse { response }).into_response(),
            Err(e) => {
                warn!(
                    user_id = user_id.as_deref().unwrap_or("guest"),
                    "Chatbot error: {e}"
                );
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": messages::CHAT_FAILED }),
                )
            }
        }
    }

    async fn ask_model(
        provider: Option<&dyn LlmProvider>,
        model: &str,
        request: &ChatbotRequest,
    ) -> AppResult<String> {
        let provider = provider.ok_or_else(|| {
            AppError::external_unavailable("gemini", "Generative model is not configured")
        })?;

        let chat = ChatRequest::new(build_conversation(&request.message, &request.history))
            .with_model(model)
            .with_temperature(limits::CHAT_TEMPERATURE)
            .with_max_tokens(limits::CHAT_MAX_OUTPUT_TOKENS);
        ensure_supported(provider, &chat)?;

        let answer = provider.complete(&chat).await?;
        if answer.truncated {
            debug!("Chatbot answer was cut at the output limit");
        }
        Ok(answer.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;

    #[test]
    fn test_quick_reply_keywords() {
        let reply = quick_reply("Gimana cara SCAN BARCODE?").unwrap();
        assert!(reply.starts_with("**Cara Scan Barcode:**"));
        assert!(reply.contains(navigation::SCAN_BARCODE));

        let reply = quick_reply("foto makanan dimana ya").unwrap();
        assert!(reply.starts_with("**Cara Scan Makanan:**"));

        let reply = quick_reply("mau ubah target kalori").unwrap();
        assert!(reply.starts_with("**Cara Atur Ulang BMI/Target Nutrisi:**"));

        let reply = quick_reply("jurnal dimana?").unwrap();
        assert!(reply.starts_with("**Cara Lihat Jurnal Harian:**"));

        assert!(quick_reply("barcode itu apa").is_none());
        assert!(quick_reply("resep sayur bayam").is_none());
    }

    #[test]
    fn test_conversation_keeps_last_history_window() {
        let history: Vec<HistoryMessage> = (0..14)
            .map(|i| HistoryMessage {
                role: if i % 2 == 0 { "user" } else { "bot" }.to_owned(),
                content: format!("pesan {i}"),
            })
            .collect();

        let conversation = build_conversation("halo", &history);
        assert_eq!(conversation.len(), 2 + limits::CHAT_HISTORY_WINDOW + 1);
        assert_eq!(conversation[1].role, MessageRole::Assistant);
        assert_eq!(conversation[2].content, "pesan 4");
        assert_eq!(conversation[2].role, MessageRole::User);
        assert_eq!(conversation[3].role, MessageRole::Assistant);
        assert_eq!(conversation.last().map(|m| m.content.as_str()), Some("halo"));
    }
}
