//! # agent-runtime
//!
//! Completion endpoints for the agent orchestrator.
//!
//! ## Providers
//!
//! - **OpenAI**: `OPENAI_API_KEY`, optional `OPENAI_BASE_URL` for any
//!   OpenAI-compatible server
//! - **Perplexity**: `PERPLEXITY_API_KEY`, reports source citations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{OpenAiProvider, Orchestrator};
//!
//! let provider = OpenAiProvider::from_env()?;
//! let orchestrator = Orchestrator::with_defaults(Arc::new(provider));
//! let turn = orchestrator.run_turn(&agent, &transcript).await?;
//! ```

pub mod openai;
mod wire;

pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Message, Orchestrator, Result, Role, Session, Tool,
    provider::ModelRouter,
};
