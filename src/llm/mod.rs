//! LLM integration for the essay companion.
//!
//! Supports any OpenAI-compatible chat completions endpoint:
//! - **Groq**: the default backend
//! - **OpenAI**: direct API access
//!
//! `OpenAiCompatProvider` implements the `LlmProvider` seam over HTTP, and
//! `TextGenerationClient` is what the conversation components talk to.

pub mod client;
pub mod openai_compat;
pub mod provider;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{GenerationSettings, TextGenerationClient};
pub use openai_compat::OpenAiCompatProvider;
pub use provider::*;

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Groq,
    OpenAi,
}

impl LlmBackend {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Groq => "llama3-70b-8192",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    /// Environment variable holding the credential for this backend.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Groq => "GROQ_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Self::Groq),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!("unknown backend '{other}' (expected groq or openai)")),
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
    /// Overrides the backend's default base URL.
    pub base_url: Option<String>,
    pub request_timeout: Duration,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| config.backend.default_base_url().to_string());

    let provider = OpenAiCompatProvider::new(
        config.backend.label(),
        base_url.as_str(),
        config.api_key.clone(),
        config.model.as_str(),
        config.request_timeout,
    )?;

    tracing::info!(
        backend = config.backend.label(),
        model = %config.model,
        base_url = %base_url,
        "LLM provider ready"
    );
    Ok(Arc::new(provider))
}
