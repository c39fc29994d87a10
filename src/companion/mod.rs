//! Reflective conversation: the guided dialogue that ends in an essay.
//!
//! The state machine asks a question, the user reflects, the analyzer turns
//! the reflection into an `InsightRecord`, and after `DEPTH_THRESHOLD`
//! reflections the synthesizer weaves the insight history into a personal
//! narrative. Every generator degrades to a literal fallback when the
//! completion service fails, so a session always reaches `Complete`.

pub mod analyzer;
pub mod machine;
pub mod model;
pub mod prompts;
pub mod question;
pub mod state;
pub mod synthesizer;

pub use analyzer::ResponseAnalyzer;
pub use machine::{ConversationStateMachine, IgnoreReason, TurnOutcome};
pub use model::{Generated, InsightRecord, Notice, Stage};
pub use question::{FALLBACK_QUESTION, QuestionGenerator};
pub use state::{ConversationPhase, ConversationSession, DEPTH_THRESHOLD};
pub use synthesizer::{FALLBACK_ESSAY, NarrativeSynthesizer};
