//! Scripted Provider
//!
//! For testing and demo purposes. Replays queued completions in order and
//! records every request it receives.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::error::{AgentError, Result};
use crate::message::{Message, ToolCall};
use crate::provider::{Completion, CompletionRequest, LlmProvider};

/// Provider that answers from a queue of canned replies
pub struct ScriptedProvider {
    name: String,
    replies: Mutex<VecDeque<Result<Completion>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::named("scripted")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue an assistant message
    pub async fn push_message(&self, message: Message) {
        self.replies
            .lock()
            .await
            .push_back(Ok(Completion::from_message("scripted", message)));
    }

    /// Queue a full completion
    pub async fn push_completion(&self, completion: Completion) {
        self.replies.lock().await.push_back(Ok(completion));
    }

    /// Queue a plain text reply
    pub async fn push_text(&self, content: &str) {
        self.push_message(Message::assistant(content)).await;
    }

    /// Queue a reply that only requests tool calls
    pub async fn push_tool_calls(&self, calls: Vec<ToolCall>) {
        self.push_message(Message::assistant_tool_calls(None, calls))
            .await;
    }

    /// Queue an endpoint failure
    pub async fn push_error(&self, error: AgentError) {
        self.replies.lock().await.push_back(Err(error));
    }

    /// Every request received so far, in order
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.requests.lock().await.push(request.clone());
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Endpoint("script exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_then_fails() {
        let provider = ScriptedProvider::new();
        provider.push_text("first").await;
        provider.push_text("second").await;

        let request = CompletionRequest::new("gpt-4o-mini", vec![Message::user("hi")]);
        let first = provider.complete(&request).await.unwrap().into_message().unwrap();
        let second = provider.complete(&request).await.unwrap().into_message().unwrap();

        assert_eq!(first.text(), Some("first"));
        assert_eq!(second.text(), Some("second"));
        assert!(matches!(
            provider.complete(&request).await,
            Err(AgentError::Endpoint(_))
        ));
        assert_eq!(provider.requests().await.len(), 3);
    }
}
