//! OpenAI-compatible chat completions provider (Groq, OpenAI).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ResponseFormat,
};
use crate::error::LlmError;

/// Error bodies are truncated to this many characters before being kept.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Provider speaking the `/chat/completions` wire format.
pub struct OpenAiCompatProvider {
    client: Client,
    provider: String,
    base_url: String,
    api_key: SecretString,
    model: String,
    timeout: Duration,
}

impl OpenAiCompatProvider {
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: SecretString,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let provider: String = provider.into();
        let base_url: String = base_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: provider.clone(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                provider: self.provider.clone(),
                after: self.timeout,
            }
        } else {
            LlmError::RequestFailed {
                provider: self.provider.clone(),
                reason: e.to_string(),
            }
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        &self.provider
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let start = Instant::now();

        let body = WireRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: match request.response_format {
                ResponseFormat::Text => None,
                ResponseFormat::JsonObject => Some(WireResponseFormat {
                    kind: "json_object",
                }),
            },
        };

        debug!(
            provider = %self.provider,
            model = %self.model,
            messages = request.messages.len(),
            json = request.response_format == ResponseFormat::JsonObject,
            "Sending completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                429 => LlmError::RateLimited {
                    provider: self.provider.clone(),
                    retry_after,
                },
                401 | 403 => LlmError::AuthFailed {
                    provider: self.provider.clone(),
                },
                code => LlmError::HttpStatus {
                    provider: self.provider.clone(),
                    status: code,
                    body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
                },
            });
        }

        let raw = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        let parsed: WireResponse = serde_json::from_str(&raw).map_err(|e| {
            LlmError::invalid_response(&self.provider, format!("Unparseable body: {e}"))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::invalid_response(&self.provider, "No choices in response"))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| LlmError::invalid_response(&self.provider, "No content in response"))?;

        let (input_tokens, output_tokens) = parsed
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        debug!(
            provider = %self.provider,
            latency_ms = start.elapsed().as_millis() as u64,
            input_tokens,
            output_tokens,
            response_id = parsed.id.as_deref().unwrap_or("-"),
            "Completion received"
        );

        Ok(CompletionResponse {
            content,
            finish_reason: FinishReason::from_wire(choice.finish_reason.as_deref()),
        })
    }
}
