//! Conversation state: phase progression and the per-run session value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::InsightRecord;
use crate::error::ConversationError;

/// Number of reflections collected before the essay is synthesized.
pub const DEPTH_THRESHOLD: usize = 5;

/// The phases of a reflective conversation.
///
/// Progresses linearly: InitialExploration → Exploring → Synthesis →
/// Complete. Synthesis only lasts for the duration of the essay call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    #[default]
    InitialExploration,
    Exploring,
    Synthesis,
    Complete,
}

impl ConversationPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: ConversationPhase) -> bool {
        use ConversationPhase::*;
        matches!(
            (self, target),
            (InitialExploration, Exploring) | (Exploring, Synthesis) | (Synthesis, Complete)
        )
    }

    /// Whether the session still accepts reflections.
    pub fn accepts_responses(&self) -> bool {
        matches!(self, Self::Exploring)
    }
}

impl std::fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InitialExploration => "initial_exploration",
            Self::Exploring => "exploring",
            Self::Synthesis => "synthesis",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// One user's run through the conversation.
///
/// Fields are private so the history stays append-only and the essay is set
/// at most once; only the state machine mutates a session.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSession {
    id: Uuid,
    phase: ConversationPhase,
    current_question: Option<String>,
    responses: Vec<String>,
    insight_history: Vec<InsightRecord>,
    essay: Option<String>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: ConversationPhase::default(),
            current_question: None,
            responses: Vec::new(),
            insight_history: Vec::new(),
            essay: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current_question.as_deref()
    }

    /// Reflections in submission order; a reflection's index is its position.
    pub fn responses(&self) -> &[String] {
        &self.responses
    }

    pub fn response(&self, index: usize) -> Option<&str> {
        self.responses.get(index).map(String::as_str)
    }

    pub fn insight_history(&self) -> &[InsightRecord] {
        &self.insight_history
    }

    pub fn latest_insight(&self) -> Option<&InsightRecord> {
        self.insight_history.last()
    }

    pub fn essay(&self) -> Option<&str> {
        self.essay.as_deref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// `(answered, DEPTH_THRESHOLD)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.insight_history.len(), DEPTH_THRESHOLD)
    }

    /// Whether enough reflections exist to synthesize the essay.
    pub fn depth_reached(&self) -> bool {
        self.insight_history.len() >= DEPTH_THRESHOLD
    }

    pub(super) fn set_question(&mut self, question: String) {
        self.current_question = Some(question);
    }

    /// Append a reflection together with its insight. Returns the reflection's
    /// index.
    pub(super) fn record(&mut self, response: String, insight: InsightRecord) -> usize {
        let index = self.responses.len();
        self.responses.push(response);
        self.insight_history.push(insight);
        index
    }

    pub(super) fn advance_to(&mut self, target: ConversationPhase) -> Result<(), ConversationError> {
        if !self.phase.can_transition_to(target) {
            return Err(ConversationError::InvalidTransition {
                from: self.phase,
                to: target,
            });
        }
        self.phase = target;
        Ok(())
    }

    /// Store the essay and enter the terminal phase.
    pub(super) fn complete(&mut self, essay: String) -> Result<(), ConversationError> {
        if self.essay.is_some() {
            return Err(ConversationError::EssayAlreadySet {
                session_id: self.id,
            });
        }
        self.advance_to(ConversationPhase::Complete)?;
        self.essay = Some(essay);
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}
