//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for chat-completion endpoints (OpenAI,
//! Perplexity, any OpenAI-compatible service) so the orchestrator works
//! with any backend without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{CompletionRequest, LlmProvider};
//!
//! let provider = OpenAiProvider::from_env()?;
//! let completion = provider.complete(&request).await?;
//! let message = completion.into_message()?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::tool::ToolSchema;

/// Sampling options forwarded verbatim to the endpoint; `None` fields are omitted
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-p nucleus sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// One call to the completion endpoint
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier (e.g., "gpt-4o-mini", "sonar-pro")
    pub model: String,

    /// System message first, then the running transcript
    pub messages: Vec<Message>,

    /// Available functions; `None` means the tools capability is off
    pub tools: Option<Vec<ToolSchema>>,

    pub options: GenerationOptions,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            tools: None,
            options: GenerationOptions::default(),
        }
    }

    /// Attach tool schemas; an empty list leaves the capability off
    pub fn with_tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tools = if tools.is_empty() { None } else { Some(tools) };
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    #[serde(other)]
    Other,
}

/// A ranked candidate message
#[derive(Clone, Debug, PartialEq)]
pub struct Choice {
    pub index: u32,
    pub message: Message,
    pub finish_reason: Option<FinishReason>,
}

/// Response from a completion call
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    /// Model that generated this response
    pub model: String,

    /// Candidates, highest ranked first
    pub choices: Vec<Choice>,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Source URLs reported by search-backed endpoints
    pub citations: Vec<String>,
}

impl Completion {
    /// Single-choice completion carrying `message`
    pub fn from_message(model: impl Into<String>, message: Message) -> Self {
        Self {
            model: model.into(),
            choices: vec![Choice {
                index: 0,
                message,
                finish_reason: None,
            }],
            usage: None,
            citations: Vec::new(),
        }
    }

    /// The highest-ranked choice's message
    pub fn into_message(self) -> Result<Message> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| AgentError::Endpoint(format!("model '{}' returned no choices", self.model)))
    }
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new completion endpoints.
/// The orchestrator works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider display name
    fn name(&self) -> &str;

    /// Issue one completion call
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

/// Routes requests to providers by model-name prefix
///
/// Requests whose model matches no registered prefix go to the default provider.
pub struct ModelRouter {
    routes: Vec<(String, Arc<dyn LlmProvider>)>,
    default: Arc<dyn LlmProvider>,
}

impl ModelRouter {
    pub fn new(default: Arc<dyn LlmProvider>) -> Self {
        Self {
            routes: Vec::new(),
            default,
        }
    }

    /// Route models starting with `prefix`; earlier routes take precedence
    pub fn route(mut self, prefix: impl Into<String>, provider: Arc<dyn LlmProvider>) -> Self {
        self.routes.push((prefix.into(), provider));
        self
    }

    /// Provider responsible for `model`
    pub fn provider_for(&self, model: &str) -> &dyn LlmProvider {
        self.routes
            .iter()
            .find(|(prefix, _)| model.starts_with(prefix.as_str()))
            .map_or(self.default.as_ref(), |(_, provider)| provider.as_ref())
    }
}

#[async_trait]
impl LlmProvider for ModelRouter {
    fn name(&self) -> &str {
        "router"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let provider = self.provider_for(&request.model);
        tracing::debug!(model = %request.model, provider = provider.name(), "Routing completion");
        provider.complete(request).await
    }
}
