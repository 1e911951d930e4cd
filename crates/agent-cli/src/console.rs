//! Terminal input and output

use std::io::{self, Write};

use async_trait::async_trait;

use acme_support::tools::OrderConfirmation;
use agent_core::{AgentError, Result, TurnEvent, TurnObserver};

/// Prints what the agents say and do as the turn runs
pub struct ConsolePrinter;

impl ConsolePrinter {
    /// Console line for `event`, if it is shown at all
    pub fn render(event: &TurnEvent) -> Option<String> {
        match event {
            TurnEvent::AssistantText { agent, content } => Some(format!("{agent}: {content}")),
            TurnEvent::ToolCall {
                agent,
                tool,
                arguments,
            } => Some(format!("{agent}: {tool}({arguments})")),
            TurnEvent::Citations { urls, .. } => Some(
                urls.iter()
                    .enumerate()
                    .map(|(i, url)| format!("[{}] {url}", i + 1))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            TurnEvent::Handoff { .. } | TurnEvent::ToolError { .. } => None,
        }
    }
}

impl TurnObserver for ConsolePrinter {
    fn on_event(&self, event: &TurnEvent) {
        // Handoffs and reported tool errors still reach the log.
        match Self::render(event) {
            Some(line) => println!("{line}"),
            None => agent_core::orchestrator::LogObserver.on_event(event),
        }
    }
}

/// Print `prompt` and read one line from stdin; `None` at end of input
pub async fn prompt_line(prompt: &str) -> Result<Option<String>> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || -> Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    })
    .await
    .map_err(|e| AgentError::Other(format!("stdin reader: {e}")))?
}

/// Asks the customer at the terminal before an order goes through
pub struct StdinConfirmation;

#[async_trait]
impl OrderConfirmation for StdinConfirmation {
    async fn confirm(&self, product: &str, price: i64) -> Result<bool> {
        println!("\n=== Order Summary ===");
        println!("Product: {product}");
        println!("Price: ${price}");
        println!("=================\n");

        let answer = prompt_line("Confirm order? y/n: ").await?;
        Ok(is_yes(answer.as_deref()))
    }
}

fn is_yes(answer: Option<&str>) -> bool {
    answer.is_some_and(|a| a.trim().eq_ignore_ascii_case("y"))
}

/// Print the hand-over report for an escalated conversation
pub fn print_escalation(summary: &str) {
    println!("Escalating to human agent...");
    println!("\n=== Escalation Report ===");
    println!("Summary: {summary}");
    println!("=========================\n");
}
