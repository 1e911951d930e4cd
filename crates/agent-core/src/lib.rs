//! # agent-core
//!
//! Multi-agent turn orchestration with a provider-agnostic completion interface.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Orchestrator                          │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌─────────────────┐  │
//! │  │ Turn loop   │──│ Agent (current)  │──│  LlmProvider    │  │
//! │  │ + handoffs  │  │ tools → schemas  │  │  (Strategy)     │  │
//! │  └─────────────┘  └──────────────────┘  └─────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A caller holds `(agent, transcript)`, usually inside a [`Session`]. Each
//! user message runs one turn; tools may hand the conversation to another
//! [`Agent`] by returning [`ToolOutput::Handoff`].

pub mod agent;
pub mod error;
pub mod message;
pub mod orchestrator;
pub mod provider;
pub mod scripted;
pub mod session;
pub mod tool;

pub use agent::Agent;
pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role, ToolCall};
pub use orchestrator::{
    Orchestrator, OrchestratorBuilder, OrchestratorConfig, ToolErrorPolicy, TurnEvent,
    TurnObserver, TurnResult,
};
pub use provider::{Completion, CompletionRequest, LlmProvider};
pub use session::Session;
pub use tool::{FunctionTool, Param, ParamKind, Tool, ToolArgs, ToolOutput, ToolSchema, ToolSignature};
