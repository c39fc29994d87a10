//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// Default per-request timeout for the completion service.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Companion configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct CompanionConfig {
    pub llm: LlmConfig,
}

impl CompanionConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("COMPANION_BACKEND") {
            Some(raw) => raw
                .parse::<LlmBackend>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "COMPANION_BACKEND".to_string(),
                    message,
                })?,
            None => LlmBackend::Groq,
        };

        let key_var = backend.api_key_var();
        let api_key = get(key_var)
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = get("COMPANION_MODEL").unwrap_or_else(|| backend.default_model().to_string());

        let base_url = get("COMPANION_API_BASE");

        let timeout_secs = match get("COMPANION_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "COMPANION_REQUEST_TIMEOUT_SECS".to_string(),
                        message: format!("expected a positive number of seconds, got '{raw}'"),
                    });
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key,
                model,
                base_url,
                request_timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}
