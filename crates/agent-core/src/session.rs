//! Session Management
//!
//! A session is the caller side of the turn loop: it owns the active agent
//! and the transcript, and merges each [`TurnResult`] back in.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::agent::Agent;
use crate::error::Result;
use crate::message::{Conversation, Message, Role};
use crate::orchestrator::{Orchestrator, TurnResult};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An interactive conversation with a (possibly changing) agent
#[derive(Clone, Debug)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Agent that will handle the next user message
    pub agent: Agent,

    /// Conversation history, without system messages
    pub conversation: Conversation,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session starting with `agent`
    pub fn new(agent: Agent) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            agent,
            conversation: Conversation::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Send one user message and run the resulting turn.
    ///
    /// On success the session adopts the turn's final agent and appends its
    /// messages, which are returned. On failure the transcript is left exactly
    /// as it was before the call, so user and assistant turns keep alternating.
    pub async fn send(
        &mut self,
        orchestrator: &Orchestrator,
        text: impl Into<String>,
    ) -> Result<&[Message]> {
        let before = self.conversation.len();
        self.conversation.push(Message::user(text));
        self.touch();

        let TurnResult {
            agent, messages, ..
        } = match orchestrator
            .run_turn(&self.agent, self.conversation.messages())
            .await
        {
            Ok(turn) => turn,
            Err(e) => {
                self.conversation.truncate(before);
                return Err(e);
            }
        };

        if agent.name != self.agent.name {
            tracing::debug!(session = %self.id, from = %self.agent.name, to = %agent.name, "Active agent changed");
        }
        self.agent = agent;

        let appended = messages.len();
        self.conversation.extend(messages);
        self.touch();

        let all = self.conversation.messages();
        Ok(&all[all.len() - appended..])
    }

    /// Last assistant text in the transcript
    pub fn last_reply(&self) -> Option<&str> {
        self.conversation
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && m.text().is_some())
            .and_then(Message::text)
    }

    /// Message count
    pub fn message_count(&self) -> usize {
        self.conversation.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;
    use crate::message::ToolCall;
    use crate::scripted::ScriptedProvider;
    use crate::tool::{FunctionTool, ToolSignature};
    use std::sync::Arc;

    fn sales() -> Agent {
        Agent::new("Sales Agent").instructions("Sell.")
    }

    fn triage() -> Agent {
        Agent::new("Triage Agent").tool(FunctionTool::new(
            ToolSignature::new("transfer_to_sales_agent"),
            |_| Ok(sales().into()),
        ))
    }

    #[test]
    fn test_session_creation() {
        let session = Session::new(triage());
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.agent.name, "Triage Agent");
        assert!(session.last_reply().is_none());
    }

    #[tokio::test]
    async fn test_send_merges_turn_and_adopts_agent() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_tool_calls(vec![ToolCall::new("call_1", "transfer_to_sales_agent", "{}")])
            .await;
        provider.push_text("Got roadrunner trouble?").await;
        let orchestrator = Orchestrator::with_defaults(provider.clone());
        let mut session = Session::new(triage());

        let appended = session
            .send(&orchestrator, "I want to buy something")
            .await
            .unwrap()
            .len();

        assert_eq!(appended, 3);
        assert_eq!(session.message_count(), 4);
        assert_eq!(session.agent, sales());
        assert_eq!(session.last_reply(), Some("Got roadrunner trouble?"));

        // the next turn starts from the sales agent with the full transcript
        provider.push_text("It costs $9000.").await;
        session.send(&orchestrator, "How much?").await.unwrap();
        let requests = provider.requests().await;
        assert_eq!(requests[2].messages[0], Message::system("Sell."));
        assert_eq!(requests[2].messages.len(), 1 + 5);
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_transcript_untouched() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_tool_calls(vec![ToolCall::new("call_1", "no_such_tool", "{}")])
            .await;
        let orchestrator = Orchestrator::with_defaults(provider);
        let mut session = Session::new(triage());

        let err = session.send(&orchestrator, "hello").await.unwrap_err();

        assert!(matches!(err, AgentError::UnknownTool(_)));
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.agent.name, "Triage Agent");
    }

    #[tokio::test]
    async fn test_roles_alternate_after_endpoint_failure() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_error(AgentError::RateLimited("429 Too Many Requests".into()))
            .await;
        provider.push_text("New Delhi.").await;
        let orchestrator = Orchestrator::with_defaults(provider.clone());
        let mut session = Session::new(sales());

        let err = session.send(&orchestrator, "Capital of India?").await.unwrap_err();
        assert!(matches!(err, AgentError::RateLimited(_)));

        session
            .send(&orchestrator, "Capital of India?")
            .await
            .unwrap();

        let requests = provider.requests().await;
        let roles: Vec<_> = requests[1].messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
        assert_eq!(session.message_count(), 2);
    }
}
