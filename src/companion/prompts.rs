//! Prompt builders for question generation, reflection analysis, and essay
//! synthesis.

use super::model::InsightRecord;

/// Persona directive for the question generator.
pub fn question_system_prompt() -> &'static str {
    "\
You are a compassionate career counselor and narrative guide.
Your goal is to ask a single, delicate question that:
- Feels warm and non-threatening
- Invites genuine, vulnerable reflection
- Uncovers hidden personal narratives
- Creates a safe emotional space for exploration

Questions should be conversational in tone, open-ended but focused, emotionally \
intelligent, and subtly provocative. Start with seemingly simple inquiries, allow for \
organic storytelling, and create space for unexpected revelations.

Design a question that feels like a caring friend genuinely interested in understanding \
someone's journey. Keep questions small; they should lead to a deep understanding of the \
response. Reply with the question only."
}

/// User-level directive requesting one question, optionally conditioned on the
/// insight drawn from the previous reflection.
pub fn question_user_prompt(context: Option<&InsightRecord>) -> String {
    match context {
        None => "This is the very first question of the conversation. Craft a small, simple, \
                 initial question that feels like a warm, curious invitation to share."
            .to_string(),
        Some(insight) => {
            let serialized = serialize_insight(insight);
            format!(
                "Here is what surfaced from their last reflection:\n{serialized}\n\n\
                 Craft one question that feels like a warm, curious invitation to share, and \
                 gently reaches one layer deeper along these themes."
            )
        }
    }
}

/// Instruction for turning one reflection into an insight record.
pub fn analysis_system_prompt() -> &'static str {
    r#"Compassionate Narrative Analysis.
Respond with a single JSON object with exactly this structure:
{
  "emotional_themes": ["short label", ...],
  "unspoken_motivations": ["short label", ...],
  "growth_indicators": ["short label", ...],
  "narrative_threads": ["short label", ...]
}
All four keys are required. Use an empty array when nothing fits.

Softly decode the response's emotional undertones, unspoken motivations, personal growth
indicators, and potential narrative threads. Listen between the lines, identify subtle
personal transformations, and respect the vulnerability of sharing. Labels are short
phrases of one to four words."#
}

pub fn analysis_user_prompt(response: &str) -> String {
    format!("Please analyze the following reflection and respond in JSON format:\n{response}")
}

/// Narrative-construction instruction with the full insight history embedded.
pub fn essay_system_prompt(insights: &[InsightRecord]) -> String {
    let serialized =
        serde_json::to_string_pretty(insights).unwrap_or_else(|_| "[]".to_string());
    format!(
        "\
Narrative Intimacy: transform personal reflections into a profoundly authentic \
Master's application essay.

Storytelling essence:
- Reveal the soul behind the achievements
- Connect personal journey to professional aspiration
- Create an emotionally resonant narrative
- Demonstrate vulnerability and strength

Narrative construction:
1. Opening: intimate personal revelation
2. Middle: bridge personal growth to professional vision
3. Conclusion: illuminate potential for transformative leadership

Candidate's insights, in the order they surfaced:
{serialized}

Write an essay that feels deeply personal, demonstrates intellectual and emotional \
depth, shows potential beyond traditional metrics, and leaves a lasting impression. \
Reply with the essay text only."
    )
}

pub fn essay_user_prompt() -> &'static str {
    "Weave a narrative that reveals the candidate's true potential."
}

fn serialize_insight(insight: &InsightRecord) -> String {
    serde_json::to_string(insight).unwrap_or_else(|_| "{}".to_string())
}
