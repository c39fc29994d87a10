use anyhow::Context;

use essay_companion::channels::CliChannel;
use essay_companion::companion::{ConversationSession, ConversationStateMachine, DEPTH_THRESHOLD};
use essay_companion::config::CompanionConfig;
use essay_companion::llm::{TextGenerationClient, create_provider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (stderr, so it never mixes with the essay on stdout)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = CompanionConfig::from_env().context("Failed to load configuration")?;

    eprintln!("🌱 MiM Essay Personal Journey Companion v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.llm.backend.label());
    eprintln!("   Model: {}", config.llm.model);
    eprintln!(
        "   {} reflections, then your essay. Finish each with an empty line.",
        DEPTH_THRESHOLD
    );
    eprintln!("   /status shows progress, /quit exits.\n");

    let llm = create_provider(&config.llm).context("Failed to create LLM provider")?;
    let machine = ConversationStateMachine::new(TextGenerationClient::new(llm));

    let mut session = ConversationSession::new();
    tracing::info!(session_id = %session.id(), "Session created");

    CliChannel::new().run(&machine, &mut session).await?;

    tracing::info!(
        session_id = %session.id(),
        phase = %session.phase(),
        reflections = session.responses().len(),
        "Session ended"
    );
    Ok(())
}
