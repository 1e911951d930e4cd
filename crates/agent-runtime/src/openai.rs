//! OpenAI-compatible LLM Provider
//!
//! Implementation of `LlmProvider` for any service exposing the
//! `/chat/completions` API: OpenAI itself and Perplexity.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::Role,
    provider::{Completion, CompletionRequest, LlmProvider},
};
use async_trait::async_trait;
use reqwest::StatusCode;

use crate::wire::{ChatRequest, ChatResponse, ErrorEnvelope, WireMessage, WireTool};

/// Base URLs of known endpoints
pub mod endpoint {
    pub const OPENAI: &str = "https://api.openai.com/v1";
    pub const PERPLEXITY: &str = "https://api.perplexity.ai";
}

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Provider configuration
#[derive(Clone)]
pub struct OpenAiConfig {
    /// Display name used in logs
    pub name: String,

    /// Base URL; `/chat/completions` is appended
    pub base_url: String,

    /// Bearer token
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl OpenAiConfig {
    /// OpenAI with the given key
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            name: "OpenAI".into(),
            base_url: endpoint::OPENAI.into(),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Perplexity with the given key
    pub fn perplexity(api_key: impl Into<String>) -> Self {
        Self {
            name: "Perplexity".into(),
            base_url: endpoint::PERPLEXITY.into(),
            ..Self::openai(api_key)
        }
    }

    /// `OPENAI_API_KEY`, optional `OPENAI_BASE_URL` and `LLM_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::openai(required_env("OPENAI_API_KEY")?);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        config.timeout_secs = timeout_from_env();
        Ok(config)
    }

    /// `PERPLEXITY_API_KEY` and optional `LLM_TIMEOUT_SECS`
    pub fn perplexity_from_env() -> Result<Self> {
        let mut config = Self::perplexity(required_env("PERPLEXITY_API_KEY")?);
        config.timeout_secs = timeout_from_env();
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AgentError::Config(format!("{key} is not set")))
}

fn timeout_from_env() -> u64 {
    std::env::var("LLM_TIMEOUT_SECS")
        .ok()
        .and_then(|t| t.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

/// OpenAI-compatible chat-completions provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OpenAiConfig::from_env()?)
    }

    pub const fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Convert a request to the wire body
    fn build_body(request: &CompletionRequest) -> ChatRequest<'_> {
        let keep_system = supports_system_role(&request.model);
        let messages = request
            .messages
            .iter()
            .filter(|m| keep_system || m.role != Role::System)
            .map(WireMessage::from)
            .collect();

        ChatRequest {
            model: &request.model,
            messages,
            tools: request
                .tools
                .as_ref()
                .map(|tools| tools.iter().map(WireTool::from).collect()),
            options: &request.options,
        }
    }

    /// Map a non-success response to an error
    fn status_error(status: StatusCode, body: &str) -> AgentError {
        let detail = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());
        let detail = format!("{status}: {detail}");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
            s if s.is_server_error() => AgentError::ProviderUnavailable(detail),
            _ => AgentError::Endpoint(detail),
        }
    }
}

/// o1-family models reject the system role
fn supports_system_role(model: &str) -> bool {
    !model.starts_with("o1")
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let body = Self::build_body(request);
        tracing::debug!(
            provider = %self.config.name,
            model = %request.model,
            messages = body.messages.len(),
            "POST chat/completions"
        );

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        if !status.is_success() {
            let err = Self::status_error(status, &text);
            tracing::warn!(provider = %self.config.name, "Completion failed: {err}");
            return Err(err);
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| AgentError::Endpoint(format!("unreadable response: {e}")))?;
        let completion = Completion::from(parsed);

        if let Some(usage) = &completion.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }

        Ok(completion)
    }
}
