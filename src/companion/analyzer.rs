//! Response analyzer: turns one free-text reflection into an
//! [`InsightRecord`].
//!
//! Every call returns a structurally complete record. Transport failures,
//! non-JSON payloads and JSON that misses any of the four fields all take the
//! same fallback path.

use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::{GenerationSettings, TextGenerationClient};

use super::model::{Generated, InsightRecord, Notice, Stage};
use super::prompts::{analysis_system_prompt, analysis_user_prompt};

const ANALYSIS_SETTINGS: GenerationSettings = GenerationSettings::new(500, 0.6);

/// Stateless analyzer of reflections.
#[derive(Clone)]
pub struct ResponseAnalyzer {
    client: TextGenerationClient,
}

impl ResponseAnalyzer {
    pub fn new(client: TextGenerationClient) -> Self {
        Self { client }
    }

    /// Single structured call validated against the schema, no fallback.
    pub async fn try_analyze(&self, response: &str) -> Result<InsightRecord, LlmError> {
        let value = self
            .client
            .complete_structured(
                analysis_system_prompt(),
                &analysis_user_prompt(response),
                ANALYSIS_SETTINGS,
            )
            .await?;

        let record = InsightRecord::from_json(value)?;
        debug!(
            themes = record.emotional_themes.len(),
            threads = record.narrative_threads.len(),
            "Reflection analyzed"
        );
        Ok(record)
    }

    /// Analyze a reflection, substituting [`InsightRecord::fallback`] on failure.
    pub async fn analyze(&self, response: &str) -> Generated<InsightRecord> {
        match self.try_analyze(response).await {
            Ok(record) => Generated::fresh(record),
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Response analysis failed, using fallback");
                Generated::fallback(
                    InsightRecord::fallback(),
                    Notice::from_error(Stage::Analysis, &e),
                )
            }
        }
    }
}
