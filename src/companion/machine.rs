//! ConversationStateMachine: sequences question generation, reflection
//! analysis and essay synthesis over an explicitly passed session.
//!
//! The machine itself holds no per-session state. Every call takes the
//! `ConversationSession` it operates on, so a presentation layer only has to
//! own one value and drive `start` / `submit_response`.

use tracing::{info, warn};

use crate::error::ConversationError;
use crate::llm::TextGenerationClient;

use super::analyzer::ResponseAnalyzer;
use super::model::Notice;
use super::question::QuestionGenerator;
use super::state::{ConversationPhase, ConversationSession};
use super::synthesizer::{NarrativeSynthesizer, check_history};

/// Why a submission was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Empty or whitespace-only reflection.
    EmptyResponse,
    /// The essay already exists; the session takes no more reflections.
    SessionComplete,
}

/// Result of one `submit_response` call.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Nothing changed.
    Ignored(IgnoreReason),
    /// Reflection stored and the next question is in `current_question`.
    Continued {
        response_index: usize,
        notices: Vec<Notice>,
    },
    /// Reflection stored and the essay is in `essay`.
    Completed {
        response_index: usize,
        notices: Vec<Notice>,
    },
}

impl TurnOutcome {
    pub fn notices(&self) -> &[Notice] {
        match self {
            Self::Ignored(_) => &[],
            Self::Continued { notices, .. } | Self::Completed { notices, .. } => notices,
        }
    }
}

/// Drives a [`ConversationSession`] through its phases.
pub struct ConversationStateMachine {
    questions: QuestionGenerator,
    analyzer: ResponseAnalyzer,
    synthesizer: NarrativeSynthesizer,
}

impl ConversationStateMachine {
    pub fn new(client: TextGenerationClient) -> Self {
        Self {
            questions: QuestionGenerator::new(client.clone()),
            analyzer: ResponseAnalyzer::new(client.clone()),
            synthesizer: NarrativeSynthesizer::new(client),
        }
    }

    /// Ask the opening question if none exists yet.
    ///
    /// Idempotent: once a question is present this returns immediately without
    /// calling the service.
    pub async fn start(&self, session: &mut ConversationSession) -> Vec<Notice> {
        if session.current_question().is_some() {
            return Vec::new();
        }

        let question = self.questions.generate(None).await;
        let notices: Vec<Notice> = question.notice.iter().cloned().collect();
        session.set_question(question.into_value());

        if let Err(e) = session.advance_to(ConversationPhase::Exploring) {
            warn!(session_id = %session.id(), error = %e, "Unexpected phase on start");
        }
        info!(session_id = %session.id(), phase = %session.phase(), "Conversation started");
        notices
    }

    /// Accept one reflection.
    ///
    /// Empty input and input after completion are ignored without touching the
    /// session. Submitting before [`start`](Self::start) is a
    /// [`ConversationError::NotStarted`].
    pub async fn submit_response(
        &self,
        session: &mut ConversationSession,
        text: &str,
    ) -> Result<TurnOutcome, ConversationError> {
        if text.trim().is_empty() {
            return Ok(TurnOutcome::Ignored(IgnoreReason::EmptyResponse));
        }

        if !session.phase().accepts_responses() {
            if session.phase() == ConversationPhase::InitialExploration {
                return Err(ConversationError::NotStarted {
                    session_id: session.id(),
                });
            }
            info!(
                session_id = %session.id(),
                phase = %session.phase(),
                "Ignoring reflection after completion"
            );
            return Ok(TurnOutcome::Ignored(IgnoreReason::SessionComplete));
        }

        let mut notices = Vec::new();

        let analysis = self.analyzer.analyze(text).await;
        notices.extend(analysis.notice.clone());
        let response_index = session.record(text.to_string(), analysis.into_value());

        info!(
            session_id = %session.id(),
            response_index,
            answered = session.insight_history().len(),
            "Reflection recorded"
        );

        if !session.depth_reached() {
            let question = self.questions.generate(session.latest_insight()).await;
            notices.extend(question.notice.clone());
            session.set_question(question.into_value());
            return Ok(TurnOutcome::Continued {
                response_index,
                notices,
            });
        }

        // History must be checked while the session is still Exploring.
        check_history(session.insight_history())?;
        self.transition(session, ConversationPhase::Synthesis)?;

        let essay = self.synthesizer.synthesize(session.insight_history()).await?;
        notices.extend(essay.notice.clone());

        session.complete(essay.into_value())?;
        info!(session_id = %session.id(), phase = %session.phase(), "Narrative complete");

        Ok(TurnOutcome::Completed {
            response_index,
            notices,
        })
    }

    fn transition(
        &self,
        session: &mut ConversationSession,
        target: ConversationPhase,
    ) -> Result<(), ConversationError> {
        let from = session.phase();
        session.advance_to(target).inspect_err(|e| {
            warn!(session_id = %session.id(), error = %e, "Phase transition rejected");
        })?;
        info!(session_id = %session.id(), %from, to = %target, "Phase transition");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::companion::model::{InsightRecord, Stage};
    use crate::companion::state::DEPTH_THRESHOLD;
    use crate::companion::question::FALLBACK_QUESTION;
    use crate::companion::synthesizer::FALLBACK_ESSAY;
    use crate::llm::testing::ScriptedLlm;
    use crate::llm::{CompletionRequest, ResponseFormat};

    const ANALYSIS: &str = r#"{
        "emotional_themes": ["quiet pride"],
        "unspoken_motivations": ["being seen"],
        "growth_indicators": ["naming fear"],
        "narrative_threads": ["the garden"]
    }"#;

    /// Answers by request shape: JSON mode gets an analysis, the essay prompt
    /// gets an essay, everything else gets a numbered question.
    fn conversational_llm() -> Arc<ScriptedLlm> {
        let counter = std::sync::atomic::AtomicUsize::new(0);
        ScriptedLlm::from_fn(move |req: &CompletionRequest| {
            if req.response_format == ResponseFormat::JsonObject {
                return Some(ANALYSIS.to_string());
            }
            if req.messages[0].content.contains("Narrative construction") {
                return Some("I grew up between two languages.".to_string());
            }
            let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Some(format!("Question {n}?"))
        })
    }

    fn machine(llm: Arc<ScriptedLlm>) -> ConversationStateMachine {
        ConversationStateMachine::new(TextGenerationClient::new(llm))
    }

    #[tokio::test]
    async fn start_asks_first_question_and_explores() {
        let llm = conversational_llm();
        let m = machine(llm.clone());
        let mut session = ConversationSession::new();

        let notices = m.start(&mut session).await;
        assert!(notices.is_empty());
        assert_eq!(session.current_question(), Some("Question 0?"));
        assert_eq!(session.phase(), ConversationPhase::Exploring);

        let first = &llm.requests()[0];
        assert!(first.messages[1].content.contains("small, simple, initial"));
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let llm = conversational_llm();
        let m = machine(llm.clone());
        let mut session = ConversationSession::new();

        m.start(&mut session).await;
        m.start(&mut session).await;
        assert_eq!(llm.call_count(), 1);
        assert_eq!(session.current_question(), Some("Question 0?"));
        assert_eq!(session.phase(), ConversationPhase::Exploring);
    }

    #[tokio::test]
    async fn full_conversation_reaches_complete() {
        let m = machine(conversational_llm());
        let mut session = ConversationSession::new();
        m.start(&mut session).await;

        for n in 1..DEPTH_THRESHOLD {
            let outcome = m
                .submit_response(&mut session, &format!("reflection {n}"))
                .await
                .unwrap();
            assert_eq!(
                outcome,
                TurnOutcome::Continued {
                    response_index: n - 1,
                    notices: vec![]
                }
            );
            assert_eq!(session.phase(), ConversationPhase::Exploring);
            assert!(session.essay().is_none());
            assert_eq!(session.responses().len(), session.insight_history().len());
            assert_eq!(session.current_question(), Some(format!("Question {n}?").as_str()));
        }

        let outcome = m.submit_response(&mut session, "reflection 5").await.unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Completed {
                response_index: 4,
                notices: vec![]
            }
        );
        assert_eq!(session.phase(), ConversationPhase::Complete);
        assert_eq!(session.essay(), Some("I grew up between two languages."));
        assert_eq!(session.responses().len(), 5);
        assert_eq!(session.insight_history().len(), 5);
        assert!(session.completed_at().is_some());
        for (i, text) in session.responses().iter().enumerate() {
            assert_eq!(text, &format!("reflection {}", i + 1));
        }
    }

    #[tokio::test]
    async fn follow_up_questions_carry_latest_insight() {
        let llm = conversational_llm();
        let m = machine(llm.clone());
        let mut session = ConversationSession::new();
        m.start(&mut session).await;
        m.submit_response(&mut session, "I kept a garden.").await.unwrap();

        // start question, analysis, follow-up question
        let requests = llm.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[2].messages[1].content.contains("the garden"));
    }

    #[tokio::test]
    async fn sixth_submission_is_a_no_op() {
        let llm = conversational_llm();
        let m = machine(llm.clone());
        let mut session = ConversationSession::new();
        m.start(&mut session).await;
        for n in 0..DEPTH_THRESHOLD {
            m.submit_response(&mut session, &format!("r{n}")).await.unwrap();
        }
        let calls = llm.call_count();
        let essay = session.essay().map(String::from);

        let outcome = m.submit_response(&mut session, "one more thing").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Ignored(IgnoreReason::SessionComplete));
        assert_eq!(session.responses().len(), 5);
        assert_eq!(session.insight_history().len(), 5);
        assert_eq!(session.essay().map(String::from), essay);
        assert_eq!(llm.call_count(), calls, "no re-synthesis");
    }

    #[tokio::test]
    async fn empty_input_changes_nothing() {
        let llm = conversational_llm();
        let m = machine(llm.clone());
        let mut session = ConversationSession::new();
        m.start(&mut session).await;

        for blank in ["", "   ", "\n\t"] {
            let outcome = m.submit_response(&mut session, blank).await.unwrap();
            assert_eq!(outcome, TurnOutcome::Ignored(IgnoreReason::EmptyResponse));
        }
        assert!(session.responses().is_empty());
        assert!(session.insight_history().is_empty());
        assert_eq!(session.phase(), ConversationPhase::Exploring);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn submit_before_start_is_a_validation_error() {
        let llm = conversational_llm();
        let m = machine(llm.clone());
        let mut session = ConversationSession::new();

        let err = m.submit_response(&mut session, "hello").await.unwrap_err();
        assert_eq!(err, ConversationError::NotStarted { session_id: session.id() });
        assert!(session.responses().is_empty());
        assert_eq!(session.phase(), ConversationPhase::InitialExploration);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn blank_input_before_start_is_ignored_not_rejected() {
        let llm = conversational_llm();
        let m = machine(llm.clone());
        let mut session = ConversationSession::new();

        let outcome = m.submit_response(&mut session, "  \n").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Ignored(IgnoreReason::EmptyResponse));
        assert_eq!(session.phase(), ConversationPhase::InitialExploration);
        assert!(session.current_question().is_none());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn oversized_history_is_rejected_before_synthesis() {
        let llm = conversational_llm();
        let m = machine(llm.clone());
        let mut session = ConversationSession::new();
        m.start(&mut session).await;
        for n in 0..DEPTH_THRESHOLD {
            session.record(format!("seeded {n}"), InsightRecord::fallback());
        }

        let err = m.submit_response(&mut session, "one too many").await.unwrap_err();
        assert_eq!(
            err,
            ConversationError::InsightCount {
                expected: DEPTH_THRESHOLD,
                actual: DEPTH_THRESHOLD + 1
            }
        );
        assert_eq!(session.phase(), ConversationPhase::Exploring);
        assert!(session.essay().is_none());
        // start question and the analysis only; no essay call
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn outage_still_completes_with_fallbacks() {
        let m = machine(ScriptedLlm::failing());
        let mut session = ConversationSession::new();

        let notices = m.start(&mut session).await;
        assert_eq!(notices.len(), 1);
        assert_eq!(session.current_question(), Some(FALLBACK_QUESTION));

        for n in 0..DEPTH_THRESHOLD - 1 {
            let outcome = m.submit_response(&mut session, &format!("r{n}")).await.unwrap();
            let stages: Vec<Stage> = outcome.notices().iter().map(|n| n.stage).collect();
            assert_eq!(stages, vec![Stage::Analysis, Stage::Question]);
        }
        let outcome = m.submit_response(&mut session, "last").await.unwrap();
        let stages: Vec<Stage> = outcome.notices().iter().map(|n| n.stage).collect();
        assert_eq!(stages, vec![Stage::Analysis, Stage::Essay]);

        assert_eq!(session.phase(), ConversationPhase::Complete);
        assert_eq!(session.essay(), Some(FALLBACK_ESSAY));
        assert!(
            session
                .insight_history()
                .iter()
                .all(|r| *r == InsightRecord::fallback())
        );
    }

    #[tokio::test]
    async fn malformed_analysis_falls_back_but_conversation_continues() {
        let llm = ScriptedLlm::script([
            Some("Opening?".to_string()),
            Some(r#"{"emotional_themes": []}"#.to_string()),
            Some("Next?".to_string()),
        ]);
        let m = machine(llm);
        let mut session = ConversationSession::new();
        m.start(&mut session).await;

        let outcome = m.submit_response(&mut session, "reflection").await.unwrap();
        assert_eq!(outcome.notices().len(), 1);
        assert_eq!(session.insight_history()[0], InsightRecord::fallback());
        assert_eq!(session.current_question(), Some("Next?"));
    }
}
