//! ACME terminal
//!
//! `acme support` runs the multi-agent support desk; `acme chat` talks to a
//! single assistant with no tools.

mod cli;
mod console;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use acme_support::SupportDesk;
use agent_core::{
    Agent, AgentError, LlmProvider, OrchestratorBuilder, Session, ToolErrorPolicy,
    provider::ModelRouter,
};
use agent_runtime::{OpenAiConfig, OpenAiProvider};

use crate::cli::{Args, ChatArgs, Command, SupportArgs};
use crate::console::{ConsolePrinter, StdinConfirmation};

/// Model-name prefix served by Perplexity
const PERPLEXITY_PREFIX: &str = "sonar";

const CHAT_INSTRUCTIONS: &str =
    "You are a helpful AI assistant. Respond in a friendly and concise manner.";

const SEARCH_INSTRUCTIONS: &str = "Be precise and concise.";

/// Instructions and sampling temperature for a plain chat on `model`
fn chat_profile(model: &str) -> (&'static str, Option<f32>) {
    if model.starts_with(PERPLEXITY_PREFIX) {
        (SEARCH_INSTRUCTIONS, Some(0.2))
    } else {
        (CHAT_INSTRUCTIONS, None)
    }
}

/// What a line typed into `acme chat` asks for
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Quit,
    Skip,
    Send(&'a str),
}

fn chat_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("quit") {
        ChatInput::Quit
    } else if line.is_empty() {
        ChatInput::Skip
    } else {
        ChatInput::Send(line)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before the filter reads RUST_LOG
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,acme_support=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let provider = build_provider()?;

    match args.into_command() {
        Command::Support(opts) => run_support(provider, opts).await,
        Command::Chat(opts) => run_chat(provider, opts).await,
    }
}

/// OpenAI by default, with `sonar*` models routed to Perplexity when its key is set
fn build_provider() -> agent_core::Result<Arc<dyn LlmProvider>> {
    let openai = OpenAiConfig::from_env().and_then(OpenAiProvider::from_config);
    let perplexity = OpenAiConfig::perplexity_from_env().and_then(OpenAiProvider::from_config);

    let provider: Arc<dyn LlmProvider> = match (openai, perplexity) {
        (Ok(openai), Ok(perplexity)) => {
            tracing::info!("Routing sonar models to Perplexity");
            Arc::new(ModelRouter::new(Arc::new(openai)).route(PERPLEXITY_PREFIX, Arc::new(perplexity)))
        }
        (Ok(openai), Err(_)) => Arc::new(openai),
        (Err(_), Ok(perplexity)) => {
            tracing::warn!("OPENAI_API_KEY not set, using Perplexity for every model");
            Arc::new(perplexity)
        }
        (Err(e), Err(_)) => return Err(e),
    };
    Ok(provider)
}

async fn run_support(provider: Arc<dyn LlmProvider>, opts: SupportArgs) -> anyhow::Result<()> {
    let mut desk = SupportDesk::new(Arc::new(StdinConfirmation));
    if let Some(model) = opts.model {
        desk = desk.with_model(model);
    }

    let mut builder = OrchestratorBuilder::new()
        .provider(provider)
        .observer(Arc::new(ConsolePrinter));
    if opts.report_tool_errors {
        builder = builder.error_policy(ToolErrorPolicy::ReportToModel);
    }
    if let Some(max) = opts.max_iterations {
        builder = builder.max_iterations(max);
    }
    let orchestrator = builder.build()?;

    let mut session = Session::new(desk.agent(opts.agent.into()));
    tracing::info!(session = %session.id, agent = %session.agent.name, "Support session started");

    while let Some(line) = console::prompt_line("User: ").await? {
        match session.send(&orchestrator, line).await {
            Ok(_) => {}
            Err(AgentError::Escalated(summary)) => {
                console::print_escalation(&summary);
                break;
            }
            Err(e) => {
                tracing::error!(session = %session.id, error = %e, "Turn failed");
                eprintln!("{}", e.user_message());
            }
        }
    }

    tracing::info!(
        session = %session.id,
        messages = session.message_count(),
        "Support session ended"
    );
    Ok(())
}

async fn run_chat(provider: Arc<dyn LlmProvider>, opts: ChatArgs) -> anyhow::Result<()> {
    let (instructions, temperature) = chat_profile(&opts.model);
    let agent = Agent::new("AI").model(opts.model).instructions(instructions);

    let mut builder = OrchestratorBuilder::new()
        .provider(provider)
        .observer(Arc::new(ConsolePrinter));
    if let Some(temperature) = temperature {
        builder = builder.temperature(temperature);
    }
    let orchestrator = builder.build()?;
    let mut session = Session::new(agent);

    println!("Type 'quit' to exit");
    while let Some(line) = console::prompt_line("You: ").await? {
        let text = match chat_input(&line) {
            ChatInput::Quit => break,
            ChatInput::Skip => continue,
            ChatInput::Send(text) => text,
        };
        if let Err(e) = session.send(&orchestrator, text).await {
            tracing::error!(error = %e, "Chat turn failed");
            eprintln!("{}", e.user_message());
        }
    }
    Ok(())
}
