//! Question generator: produces the next conversational prompt.

use tracing::warn;

use crate::error::LlmError;
use crate::llm::{GenerationSettings, TextGenerationClient};

use super::model::{Generated, InsightRecord, Notice, Stage};
use super::prompts::{question_system_prompt, question_user_prompt};

/// Asked whenever the service cannot produce a question.
pub const FALLBACK_QUESTION: &str =
    "What small moment in your life has quietly shaped who you are today?";

const QUESTION_SETTINGS: GenerationSettings = GenerationSettings::new(300, 0.5);

/// Stateless generator of warm, open-ended questions.
#[derive(Clone)]
pub struct QuestionGenerator {
    client: TextGenerationClient,
}

impl QuestionGenerator {
    pub fn new(client: TextGenerationClient) -> Self {
        Self { client }
    }

    /// Single service call, no fallback.
    pub async fn try_generate(&self, context: Option<&InsightRecord>) -> Result<String, LlmError> {
        self.client
            .complete_text(
                question_system_prompt(),
                &question_user_prompt(context),
                QUESTION_SETTINGS,
            )
            .await
    }

    /// Produce a question, substituting [`FALLBACK_QUESTION`] on failure.
    pub async fn generate(&self, context: Option<&InsightRecord>) -> Generated<String> {
        match self.try_generate(context).await {
            Ok(question) => Generated::fresh(question),
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Question generation failed, using fallback");
                Generated::fallback(
                    FALLBACK_QUESTION.to_string(),
                    Notice::from_error(Stage::Question, &e),
                )
            }
        }
    }
}
