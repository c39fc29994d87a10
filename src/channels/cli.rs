//! CLI channel: stdin/stdout front end for a single reflective session.
//!
//! A reflection may span several lines; an empty line submits it.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::companion::{
    ConversationSession, ConversationStateMachine, IgnoreReason, Notice, TurnOutcome,
};
use crate::error::Result;

/// What a line of input amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliInput {
    /// A finished reflection (possibly empty).
    Submit(String),
    Status,
    Quit,
}

/// Accumulates lines until the user submits.
#[derive(Debug, Default)]
pub struct ReflectionBuffer {
    lines: Vec<String>,
}

impl ReflectionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns an input once the line completes one.
    ///
    /// Commands are recognized only at the start of a reflection.
    pub fn push_line(&mut self, line: &str) -> Option<CliInput> {
        let trimmed = line.trim();

        if self.lines.is_empty() {
            match trimmed {
                "/quit" | "/exit" => return Some(CliInput::Quit),
                "/status" => return Some(CliInput::Status),
                _ => {}
            }
        }

        if trimmed.is_empty() {
            let text = self.lines.join("\n");
            self.lines.clear();
            return Some(CliInput::Submit(text));
        }

        self.lines.push(line.trim_end().to_string());
        None
    }

    /// Flush at end of input: an unfinished reflection is submitted as is.
    pub fn finish(&mut self) -> Option<CliInput> {
        if self.lines.is_empty() {
            return None;
        }
        let text = self.lines.join("\n");
        self.lines.clear();
        Some(CliInput::Submit(text))
    }
}

/// Runs one session against stdin/stdout.
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(
        &self,
        machine: &ConversationStateMachine,
        session: &mut ConversationSession,
    ) -> Result<()> {
        eprintln!("⏳ Finding a gentle place to begin...");
        let notices = machine.start(session).await;
        print_notices(&notices);
        println!("\n{}", render_question(session));
        eprint!("> ");

        let stdin = tokio::io::stdin();
        let mut lines = BufReader::new(stdin).lines();
        let mut buffer = ReflectionBuffer::new();

        loop {
            let input = match lines.next_line().await? {
                Some(line) => match buffer.push_line(&line) {
                    Some(input) => input,
                    None => {
                        eprint!("  ");
                        continue;
                    }
                },
                None => match buffer.finish() {
                    Some(input) => input,
                    None => break,
                },
            };

            match input {
                CliInput::Quit => break,
                CliInput::Status => {
                    eprintln!("ℹ️  {}", render_status(session));
                }
                CliInput::Submit(text) => {
                    if !text.trim().is_empty() {
                        eprintln!("⏳ Listening...");
                    }
                    let outcome = machine.submit_response(session, &text).await?;
                    print_notices(outcome.notices());
                    match outcome {
                        TurnOutcome::Ignored(IgnoreReason::EmptyResponse) => {}
                        TurnOutcome::Ignored(IgnoreReason::SessionComplete) => break,
                        TurnOutcome::Continued { .. } => {
                            println!("\n{}", render_question(session));
                        }
                        TurnOutcome::Completed { .. } => {
                            println!("\n{}", render_completion(session));
                            break;
                        }
                    }
                }
            }
            eprint!("> ");
        }

        Ok(())
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        eprintln!("⚠️  {notice}");
    }
}

/// Current question with progress, e.g. "💬 (2/5) What ...?".
pub fn render_question(session: &ConversationSession) -> String {
    let (answered, total) = session.progress();
    let question = session.current_question().unwrap_or_default();
    format!("💬 ({}/{}) {}", answered + 1, total, question)
}

pub fn render_status(session: &ConversationSession) -> String {
    let (answered, total) = session.progress();
    format!(
        "Session {} | started {} | phase: {} | reflections: {}/{}",
        session.id(),
        session.started_at().format("%Y-%m-%d %H:%M UTC"),
        session.phase(),
        answered,
        total
    )
}

/// Success indicator followed by the essay.
pub fn render_completion(session: &ConversationSession) -> String {
    format!(
        "✅ Your Personal Narrative Emerges...\n\n{}\n",
        session.essay().unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_accumulate_until_blank() {
        let mut buf = ReflectionBuffer::new();
        assert_eq!(buf.push_line("When I was nine,"), None);
        assert_eq!(buf.push_line("I fixed my first bike.  "), None);
        assert_eq!(
            buf.push_line(""),
            Some(CliInput::Submit("When I was nine,\nI fixed my first bike.".into()))
        );
        // Buffer resets after submit
        assert_eq!(buf.push_line("   "), Some(CliInput::Submit(String::new())));
    }

    #[test]
    fn commands_only_at_start_of_reflection() {
        let mut buf = ReflectionBuffer::new();
        assert_eq!(buf.push_line("/status"), Some(CliInput::Status));
        assert_eq!(buf.push_line(" /quit "), Some(CliInput::Quit));

        assert_eq!(buf.push_line("I wrote"), None);
        assert_eq!(buf.push_line("/quit"), None);
        assert_eq!(
            buf.push_line(""),
            Some(CliInput::Submit("I wrote\n/quit".into()))
        );
    }

    #[test]
    fn end_of_input_flushes_unfinished_reflection() {
        let mut buf = ReflectionBuffer::new();
        assert_eq!(buf.push_line("The last thing I want to say"), None);
        assert_eq!(buf.push_line("is thank you."), None);
        assert_eq!(
            buf.finish(),
            Some(CliInput::Submit("The last thing I want to say\nis thank you.".into()))
        );
        assert_eq!(buf.finish(), None);
    }

    #[test]
    fn end_of_input_with_empty_buffer_submits_nothing() {
        let mut buf = ReflectionBuffer::new();
        assert_eq!(buf.finish(), None);
        assert_eq!(buf.push_line("done"), None);
        assert!(matches!(buf.push_line(""), Some(CliInput::Submit(_))));
        assert_eq!(buf.finish(), None);
    }

    #[test]
    fn fresh_session_renders_first_slot() {
        let session = ConversationSession::new();
        assert!(render_question(&session).starts_with("💬 (1/5)"));
        let status = render_status(&session);
        assert!(status.contains("initial_exploration"));
        assert!(status.contains("0/5"));
        assert!(status.contains(&session.started_at().format("%Y-%m-%d").to_string()));
    }

    #[test]
    fn completion_carries_success_indicator() {
        let session = ConversationSession::new();
        assert!(render_completion(&session).contains("Your Personal Narrative Emerges..."));
    }
}
