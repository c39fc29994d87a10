//! Text generation client: the single point of contact with the completion
//! service.
//!
//! Returns either free text or a parsed JSON object. It never substitutes
//! content: empty text and non-object JSON come back as errors and the
//! caller decides what to do about them.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::provider::{ChatMessage, CompletionRequest, FinishReason, LlmProvider};
use crate::error::LlmError;

/// Sampling settings for one kind of call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationSettings {
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

/// Thin wrapper over an [`LlmProvider`] exposing text and structured calls.
#[derive(Clone)]
pub struct TextGenerationClient {
    llm: Arc<dyn LlmProvider>,
}

impl TextGenerationClient {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Free-text completion. Fails on empty output.
    pub async fn complete_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        settings: GenerationSettings,
    ) -> Result<String, LlmError> {
        let request = self.request(system_prompt, user_prompt, settings);
        let response = self.llm.complete(request).await?;

        let text = response.content.trim();
        if text.is_empty() {
            let reason = if response.finish_reason == FinishReason::Length {
                "empty content (finish_reason=length)"
            } else {
                "empty content"
            };
            return Err(LlmError::invalid_response(self.llm.provider_name(), reason));
        }
        Ok(text.to_string())
    }

    /// Structured completion in JSON-object mode. Fails unless the payload is
    /// a single JSON object.
    pub async fn complete_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        settings: GenerationSettings,
    ) -> Result<Value, LlmError> {
        let request = self
            .request(system_prompt, user_prompt, settings)
            .with_json_output();
        let response = self.llm.complete(request).await?;

        let json_str = extract_json_object(&response.content);
        let value: Value = serde_json::from_str(json_str).map_err(|e| {
            warn!(
                provider = self.llm.provider_name(),
                error = %e,
                "Structured completion was not valid JSON"
            );
            LlmError::invalid_response(self.llm.provider_name(), format!("not JSON: {e}"))
        })?;

        if !value.is_object() {
            return Err(LlmError::invalid_response(
                self.llm.provider_name(),
                "expected a JSON object",
            ));
        }
        Ok(value)
    }

    fn request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        settings: GenerationSettings,
    ) -> CompletionRequest {
        CompletionRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ])
        .with_max_tokens(settings.max_tokens)
        .with_temperature(settings.temperature)
    }
}

/// Slice the JSON object out of model output: unwraps a markdown fence,
/// then keeps the span from the first `{` to the last `}` so leading or
/// trailing prose is dropped.
pub(crate) fn extract_json_object(text: &str) -> &str {
    let text = text.trim();
    let body = if text.starts_with('{') {
        text
    } else {
        strip_code_fence(text)
    };

    match (body.find('{'), body.rfind('}')) {
        (Some(open), Some(close)) if close > open => &body[open..=close],
        _ => body,
    }
}

/// Contents of the first ``` fence (with or without a `json` tag), or the
/// input unchanged when there is none.
fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let inner = &text[open + 3..];
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    match inner.find("```") {
        Some(close) => inner[..close].trim(),
        None => inner.trim(),
    }
}
