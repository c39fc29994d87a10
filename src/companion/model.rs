//! Insight records and generation results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Structured extraction from one reflection.
///
/// All four fields are always present. Deserialization fails when any of them
/// is missing, so a partially filled record cannot be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightRecord {
    pub emotional_themes: BTreeSet<String>,
    pub unspoken_motivations: BTreeSet<String>,
    pub growth_indicators: BTreeSet<String>,
    pub narrative_threads: BTreeSet<String>,
}

impl InsightRecord {
    /// Record used when a reflection could not be analyzed.
    pub fn fallback() -> Self {
        Self {
            emotional_themes: labels(["Personal Growth", "Resilience"]),
            unspoken_motivations: labels(["Self-improvement"]),
            growth_indicators: labels(["Reflection"]),
            narrative_threads: labels(["Personal Journey"]),
        }
    }

    /// Validate a JSON payload against the four-field schema.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

fn labels<const N: usize>(items: [&str; N]) -> BTreeSet<String> {
    items.into_iter().map(String::from).collect()
}

/// Which component produced a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Question,
    Analysis,
    Essay,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Question => "Question Generation",
            Self::Analysis => "Response Analysis",
            Self::Essay => "Essay Generation",
        };
        write!(f, "{s}")
    }
}

/// Human-readable note that a component fell back to its literal default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub stage: Stage,
    pub message: String,
}

impl Notice {
    pub fn from_error(stage: Stage, error: &LlmError) -> Self {
        Self {
            stage,
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Error: {}", self.stage, self.message)
    }
}

/// Output of a generator: the value, plus a notice when it is the fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated<T> {
    pub value: T,
    pub notice: Option<Notice>,
}

impl<T> Generated<T> {
    pub fn fresh(value: T) -> Self {
        Self {
            value,
            notice: None,
        }
    }

    pub fn fallback(value: T, notice: Notice) -> Self {
        Self {
            value,
            notice: Some(notice),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.notice.is_some()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
