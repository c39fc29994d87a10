//! Narrative synthesizer: weaves the full insight history into the essay.

use tracing::{info, warn};

use crate::error::{ConversationError, LlmError};
use crate::llm::{GenerationSettings, TextGenerationClient};

use super::model::{Generated, InsightRecord, Notice, Stage};
use super::prompts::{essay_system_prompt, essay_user_prompt};
use super::state::DEPTH_THRESHOLD;

/// Returned when the service cannot produce the essay.
pub const FALLBACK_ESSAY: &str = "A personal reflection on growth, potential, and the \
transformative power of continuous learning.";

const ESSAY_SETTINGS: GenerationSettings = GenerationSettings::new(1500, 0.8);

#[derive(Clone)]
pub struct NarrativeSynthesizer {
    client: TextGenerationClient,
}

impl NarrativeSynthesizer {
    pub fn new(client: TextGenerationClient) -> Self {
        Self { client }
    }

    /// Single free-text call, no fallback.
    pub async fn try_synthesize(&self, insights: &[InsightRecord]) -> Result<String, LlmError> {
        self.client
            .complete_text(
                &essay_system_prompt(insights),
                essay_user_prompt(),
                ESSAY_SETTINGS,
            )
            .await
    }

    /// Synthesize the essay from exactly [`DEPTH_THRESHOLD`] insights,
    /// substituting [`FALLBACK_ESSAY`] when the service fails.
    ///
    /// A history of any other length is a caller bug and returns
    /// [`ConversationError::InsightCount`] without calling the service.
    pub async fn synthesize(
        &self,
        insights: &[InsightRecord],
    ) -> Result<Generated<String>, ConversationError> {
        check_history(insights)?;

        Ok(match self.try_synthesize(insights).await {
            Ok(essay) => {
                info!(chars = essay.len(), "Essay synthesized");
                Generated::fresh(essay)
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Essay generation failed, using fallback");
                Generated::fallback(FALLBACK_ESSAY.to_string(), Notice::from_error(Stage::Essay, &e))
            }
        })
    }
}

/// An essay is woven from exactly [`DEPTH_THRESHOLD`] insight records.
pub(crate) fn check_history(insights: &[InsightRecord]) -> Result<(), ConversationError> {
    if insights.len() != DEPTH_THRESHOLD {
        return Err(ConversationError::InsightCount {
            expected: DEPTH_THRESHOLD,
            actual: insights.len(),
        });
    }
    Ok(())
}
