//! Command-line arguments

use acme_support::Desk;
use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for the ACME terminal
#[derive(Parser, Debug)]
#[command(name = "acme", version, about = "ACME Inc. customer service from the terminal")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    /// Subcommand to run; `support` when none was given
    pub fn into_command(self) -> Command {
        self.command
            .unwrap_or_else(|| Command::Support(SupportArgs::default()))
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Talk to the support desk (default)
    Support(SupportArgs),

    /// Plain chat with a single assistant
    Chat(ChatArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct SupportArgs {
    /// Desk the conversation starts at
    #[arg(long, value_enum, default_value_t = StartDesk::Triage)]
    pub agent: StartDesk,

    /// Model for every desk
    #[arg(long)]
    pub model: Option<String>,

    /// Send tool failures back to the model instead of ending the turn
    #[arg(long)]
    pub report_tool_errors: bool,

    /// Completion calls allowed per turn
    #[arg(long)]
    pub max_iterations: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct ChatArgs {
    /// Model to chat with; `sonar*` models go to Perplexity
    #[arg(long, default_value = "gpt-4o")]
    pub model: String,
}

/// Desk names accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartDesk {
    #[default]
    Triage,
    Sales,
    Issues,
    Refund,
    SalesAssistant,
}

impl From<StartDesk> for Desk {
    fn from(desk: StartDesk) -> Self {
        match desk {
            StartDesk::Triage => Self::Triage,
            StartDesk::Sales => Self::Sales,
            StartDesk::Issues => Self::IssuesAndRepairs,
            StartDesk::Refund => Self::Refund,
            StartDesk::SalesAssistant => Self::SalesAssistant,
        }
    }
}
