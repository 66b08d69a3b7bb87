// ABOUTME: Per-product nutrition analysis through the generative model
// ABOUTME: Cleans and normalizes the model answer and falls back to the heuristic on failure

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::llm::prompts::food_analysis_prompt;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::nutrition::{clean_and_parse, heuristic, HeuristicInput};

/// Where an analysis came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    /// Generative model answer
    Model,
    /// Rule-based fallback
    Heuristic,
}

/// An analysis ready to be returned as `{"analysis": ...}`
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    /// Normalized object, raw JSON or cleaned text
    pub analysis: Value,
    /// Producer of the analysis
    pub source: AnalysisSource,
}

/// Analyze one product
///
/// Uses the heuristic when no provider is configured, the call fails or the
/// model answers with nothing.
pub async fn analyze(
    provider: Option<&dyn LlmProvider>,
    model: &str,
    input: &HeuristicInput,
) -> AnalysisOutcome {
    let Some(provider) = provider else {
        info!("No generative model configured, using heuristic analysis");
        return heuristic_outcome(input);
    };

    let request =
        ChatRequest::new(vec![ChatMessage::user(food_analysis_prompt(input))]).with_model(model);

    match provider.complete(&request).await {
        Ok(response) if !response.content.trim().is_empty() => AnalysisOutcome {
            analysis: clean_and_parse(&response.content).into_value(),
            source: AnalysisSource::Model,
        },
        Ok(_) => {
            warn!(provider = provider.name(), "Model returned an empty analysis");
            heuristic_outcome(input)
        }
        Err(e) => {
            warn!(provider = provider.name(), "Model analysis failed: {e}");
            heuristic_outcome(input)
        }
    }
}

fn heuristic_outcome(input: &HeuristicInput) -> AnalysisOutcome {
    let analysis = heuristic::generate(input);
    AnalysisOutcome {
        analysis: serde_json::to_value(analysis).unwrap_or(Value::Null),
        source: AnalysisSource::Heuristic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::llm::ScriptedLlmProvider;

    fn input() -> HeuristicInput {
        HeuristicInput {
            product_name: "Produk Test".to_owned(),
            calories: 200.0,
            protein: 5.0,
            carbs: 30.0,
            fat: 8.0,
            sugar: 10.0,
            salt: 0.5,
        }
    }

    #[tokio::test]
    async fn test_without_provider_uses_heuristic() {
        let outcome = analyze(None, "gemini", &input()).await;
        assert_eq!(outcome.source, AnalysisSource::Heuristic);
        assert_eq!(outcome.analysis["source"], "heuristic");
        assert_eq!(outcome.analysis["risks"][0], "Diabetes tipe 2");
    }

    #[tokio::test]
    async fn test_failed_call_uses_heuristic() {
        let provider = ScriptedLlmProvider::new()
            .then_error(AppError::external_service("Gemini", "quota exceeded"));
        let outcome = analyze(Some(&provider), "gemini", &input()).await;
        assert_eq!(outcome.source, AnalysisSource::Heuristic);
    }

    #[tokio::test]
    async fn test_model_answer_is_normalized() {
        let provider = ScriptedLlmProvider::new()
            .then_text("```json\n{\"summary\":\" Manis \",\"risks\":\"Diabetes; Obesitas\"}\n```");
        let outcome = analyze(Some(&provider), "gemini-test", &input()).await;

        assert_eq!(outcome.source, AnalysisSource::Model);
        assert_eq!(outcome.analysis["summary"], "Manis");
        assert_eq!(outcome.analysis["risks"][1], "Obesitas");

        let requests = provider.requests();
        assert_eq!(requests[0].model.as_deref(), Some("gemini-test"));
        assert!(requests[0].messages[0].content.contains("Produk Test"));
    }
}
