//! Error types for the essay companion.

use std::time::Duration;

use crate::companion::ConversationPhase;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Broad classification of an [`LlmError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Transport failure, timeout, rate limiting or a non-success status.
    Service,
    /// The service answered, but the content does not have the expected shape.
    MalformedOutput,
}

/// Text-generation service errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {after:?}")]
    Timeout { provider: String, after: Duration },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} returned HTTP {status}: {body}")]
    HttpStatus {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    pub fn kind(&self) -> LlmErrorKind {
        match self {
            Self::RequestFailed { .. }
            | Self::Timeout { .. }
            | Self::RateLimited { .. }
            | Self::AuthFailed { .. }
            | Self::HttpStatus { .. } => LlmErrorKind::Service,
            Self::InvalidResponse { .. } | Self::Json(_) => LlmErrorKind::MalformedOutput,
        }
    }

    /// Shorthand for a malformed-output error attributed to `provider`.
    pub fn invalid_response(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

/// Misuse of the conversation API. These indicate an orchestration bug, not
/// a runtime condition to degrade from.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Session {session_id} has no active question; call start() first")]
    NotStarted { session_id: uuid::Uuid },

    #[error("Narrative synthesis needs exactly {expected} insight records, got {actual}")]
    InsightCount { expected: usize, actual: usize },

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition {
        from: ConversationPhase,
        to: ConversationPhase,
    },

    #[error("Session {session_id} already has an essay")]
    EssayAlreadySet { session_id: uuid::Uuid },
}

/// Result type alias for the companion.
pub type Result<T> = std::result::Result<T, Error>;
