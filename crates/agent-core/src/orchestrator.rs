//! Turn Orchestrator
//!
//! Drives one user turn to completion. Each round trip sends the current
//! agent's instructions plus the running transcript to the completion
//! endpoint, executes any tool calls the model requests, applies handoffs,
//! and stops once the model answers without tool calls.
//!
//! ```text
//!   AwaitingModel ──tool calls──▶ ExecutingTools
//!        ▲                              │
//!        └──────── results appended ────┘
//!   AwaitingModel ──no tool calls──▶ Done
//! ```

use std::sync::Arc;

use crate::agent::Agent;
use crate::error::{AgentError, Result};
use crate::message::{Message, ToolCall};
use crate::provider::{CompletionRequest, GenerationOptions, LlmProvider};
use crate::tool::{ToolOutput, ToolRegistry};

/// Tool message content that replaces a handoff tool's result
pub fn handoff_announcement(agent: &Agent) -> String {
    format!("Transferred to {}. Adopt persona immediately.", agent.name)
}

/// What to do when a tool call cannot be resolved, decoded or executed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToolErrorPolicy {
    /// Abort the turn and return the error to the caller
    #[default]
    Propagate,

    /// Answer the call with an `Error: ...` tool message and keep looping
    ReportToModel,
}

/// Orchestrator configuration
#[derive(Clone, Debug, Default)]
pub struct OrchestratorConfig {
    pub error_policy: ToolErrorPolicy,

    /// Completion calls allowed per turn; `None` loops until the model stops calling tools
    pub max_iterations: Option<usize>,

    /// Sampling options sent with every request
    pub generation: GenerationOptions,
}

/// Orchestrator loop state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnState {
    AwaitingModel,
    ExecutingTools,
    Done,
}

/// Observable side effects of a turn, reported as they happen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnEvent {
    /// The model produced text while `agent` was active
    AssistantText { agent: String, content: String },

    /// A tool is about to run
    ToolCall {
        agent: String,
        tool: String,
        arguments: String,
    },

    /// The active agent changed
    Handoff { from: String, to: String },

    /// The endpoint cited sources for its reply
    Citations { agent: String, urls: Vec<String> },

    /// A tool failure was reported back to the model
    ToolError {
        agent: String,
        tool: String,
        error: String,
    },
}

/// Receives turn events; called synchronously from the loop
pub trait TurnObserver: Send + Sync {
    fn on_event(&self, event: &TurnEvent);
}

/// Observer that writes events to the tracing log
pub struct LogObserver;

impl TurnObserver for LogObserver {
    fn on_event(&self, event: &TurnEvent) {
        match event {
            TurnEvent::AssistantText { agent, content } => {
                tracing::info!(agent = %agent, "{content}");
            }
            TurnEvent::ToolCall {
                agent,
                tool,
                arguments,
            } => {
                tracing::info!(agent = %agent, tool = %tool, arguments = %arguments, "Tool call");
            }
            TurnEvent::Handoff { from, to } => {
                tracing::info!(from = %from, to = %to, "Handoff");
            }
            TurnEvent::Citations { agent, urls } => {
                tracing::info!(agent = %agent, count = urls.len(), "Citations: {}", urls.join(", "));
            }
            TurnEvent::ToolError { agent, tool, error } => {
                tracing::warn!(agent = %agent, tool = %tool, "Tool failed: {error}");
            }
        }
    }
}

/// Outcome of a completed turn
#[derive(Clone, Debug, PartialEq)]
pub struct TurnResult {
    /// Agent active when the turn finished
    pub agent: Agent,

    /// Messages appended during this turn only
    pub messages: Vec<Message>,

    /// Completion calls issued
    pub round_trips: usize,
}

/// Runs turns against a completion endpoint
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    config: OrchestratorConfig,
    observer: Arc<dyn TurnObserver>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: OrchestratorConfig) -> Self {
        Self {
            provider,
            config,
            observer: Arc::new(LogObserver),
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>) -> Self {
        Self::new(provider, OrchestratorConfig::default())
    }

    pub fn with_observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one turn for `agent` over `transcript`.
    ///
    /// The caller's transcript is not modified; the returned [`TurnResult`]
    /// carries the messages to append. Any error aborts the turn and no
    /// partial result is returned.
    pub async fn run_turn(&self, agent: &Agent, transcript: &[Message]) -> Result<TurnResult> {
        let start = transcript.len();
        let mut messages = transcript.to_vec();
        let mut current = agent.clone();
        let mut round_trips = 0;
        let mut state = TurnState::AwaitingModel;

        while state != TurnState::Done {
            if let Some(max) = self.config.max_iterations {
                if round_trips >= max {
                    return Err(AgentError::MaxIterations(max));
                }
            }

            // Rebuilt every round so a handoff exposes the new agent's tools.
            let registry = current.registry();
            let request = CompletionRequest::new(&current.model, with_system(&current, &messages))
                .with_tools(current.tool_schemas()?)
                .with_options(self.config.generation.clone());

            tracing::debug!(
                agent = %current.name,
                model = %current.model,
                messages = request.messages.len(),
                tools = request.tools.as_ref().map_or(0, Vec::len),
                "Requesting completion"
            );
            round_trips += 1;
            let mut completion = self.provider.complete(&request).await?;
            if !completion.citations.is_empty() {
                self.observer.on_event(&TurnEvent::Citations {
                    agent: current.name.clone(),
                    urls: std::mem::take(&mut completion.citations),
                });
            }
            let reply = completion.into_message()?;

            if let Some(text) = reply.text() {
                self.observer.on_event(&TurnEvent::AssistantText {
                    agent: current.name.clone(),
                    content: text.to_string(),
                });
            }

            let calls = reply.tool_calls.clone();
            messages.push(reply);

            if calls.is_empty() {
                state = transition(state, TurnState::Done);
                continue;
            }

            state = transition(state, TurnState::ExecutingTools);
            for call in &calls {
                let content = self.execute_call(&registry, &mut current, call).await?;
                messages.push(Message::tool(content, call.id.clone()));
            }
            state = transition(state, TurnState::AwaitingModel);
        }

        Ok(TurnResult {
            agent: current,
            messages: messages.split_off(start),
            round_trips,
        })
    }

    /// Execute one call against the lookup built at the start of the round.
    ///
    /// A handoff earlier in the same assistant message changes `current` but not
    /// `registry`, so later calls in that message still resolve against the
    /// agent that was active when the message arrived.
    async fn execute_call(
        &self,
        registry: &ToolRegistry,
        current: &mut Agent,
        call: &ToolCall,
    ) -> Result<String> {
        self.observer.on_event(&TurnEvent::ToolCall {
            agent: current.name.clone(),
            tool: call.name.clone(),
            arguments: call.arguments.clone(),
        });

        match registry.execute(call).await {
            Ok(ToolOutput::Reply(text)) => Ok(text),
            Ok(ToolOutput::Handoff(next)) => {
                self.observer.on_event(&TurnEvent::Handoff {
                    from: current.name.clone(),
                    to: next.name.clone(),
                });
                let announcement = handoff_announcement(&next);
                *current = next;
                Ok(announcement)
            }
            Err(e)
                if e.is_tool_failure()
                    && self.config.error_policy == ToolErrorPolicy::ReportToModel =>
            {
                self.observer.on_event(&TurnEvent::ToolError {
                    agent: current.name.clone(),
                    tool: call.name.clone(),
                    error: e.to_string(),
                });
                Ok(format!("Error: {e}"))
            }
            Err(e) => Err(e),
        }
    }
}

fn with_system(agent: &Agent, transcript: &[Message]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    messages.push(Message::system(&agent.instructions));
    messages.extend_from_slice(transcript);
    messages
}

fn transition(from: TurnState, to: TurnState) -> TurnState {
    tracing::debug!(?from, ?to, "Turn state");
    to
}

/// Builder for an [`Orchestrator`]
pub struct OrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    config: OrchestratorConfig,
    observer: Option<Arc<dyn TurnObserver>>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            config: OrchestratorConfig::default(),
            observer: None,
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn TurnObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub const fn error_policy(mut self, policy: ToolErrorPolicy) -> Self {
        self.config.error_policy = policy;
        self
    }

    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = Some(max);
        self
    }

    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = Some(temp);
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        let orchestrator = Orchestrator::new(provider, self.config);
        Ok(match self.observer {
            Some(observer) => orchestrator.with_observer(observer),
            None => orchestrator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::scripted::ScriptedProvider;
    use crate::tool::{FunctionTool, Param, ToolSignature};
    use std::sync::Mutex;

    fn look_up_item() -> FunctionTool {
        FunctionTool::new(
            ToolSignature::new("look_up_item")
                .doc("Use to find item ID.")
                .param(Param::new("search_query")),
            |_| Ok("item_132612938".into()),
        )
    }

    fn agent_c() -> Agent {
        Agent::new("Agent C").instructions("You are C.")
    }

    fn transfer_to_c() -> FunctionTool {
        FunctionTool::new(ToolSignature::new("transfer_to_C"), |_| Ok(agent_c().into()))
    }

    fn failing_tool() -> FunctionTool {
        FunctionTool::new(ToolSignature::new("explode"), |args| {
            Err(AgentError::tool("explode", format!("{:?}", args.values())))
        })
    }

    fn orchestrator(provider: &Arc<ScriptedProvider>) -> Orchestrator {
        Orchestrator::with_defaults(provider.clone())
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<TurnEvent>>);

    impl TurnObserver for Recorder {
        fn on_event(&self, event: &TurnEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[tokio::test]
    async fn test_no_tools_finishes_in_one_round_trip() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_text("Hello! How can I help?").await;
        let agent = Agent::new("Triage Agent").instructions("Be brief.");

        let result = orchestrator(&provider)
            .run_turn(&agent, &[Message::user("hi")])
            .await
            .unwrap();

        assert_eq!(result.round_trips, 1);
        assert_eq!(result.agent, agent);
        assert_eq!(result.messages, vec![Message::assistant("Hello! How can I help?")]);

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].tools.is_none());
        assert_eq!(requests[0].model, "gpt-4o-mini");
        assert_eq!(requests[0].messages[0], Message::system("Be brief."));
        assert_eq!(requests[0].messages[1], Message::user("hi"));
    }

    #[tokio::test]
    async fn test_look_up_item_scenario() {
        let provider = Arc::new(ScriptedProvider::new());
        let call = ToolCall::new("call_1", "look_up_item", r#"{"search_query": "broken widget"}"#);
        provider.push_tool_calls(vec![call.clone()]).await;
        provider.push_text("Your item ID is item_132612938.").await;
        let agent = Agent::new("A").tool(look_up_item());

        let result = orchestrator(&provider)
            .run_turn(&agent, &[Message::user("my widget broke")])
            .await
            .unwrap();

        assert_eq!(result.agent, agent);
        assert_eq!(
            result.messages,
            vec![
                Message::assistant_tool_calls(None, vec![call]),
                Message::tool("item_132612938", "call_1"),
                Message::assistant("Your item ID is item_132612938."),
            ]
        );
        assert_eq!(result.round_trips, 2);

        let requests = provider.requests().await;
        let tools = requests[0].tools.as_ref().unwrap();
        assert_eq!(tools[0].name, "look_up_item");
        // second request carries the system message, user, tool call and tool result
        assert_eq!(requests[1].messages.len(), 4);
    }

    #[tokio::test]
    async fn test_handoff_switches_agent_and_announces() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_tool_calls(vec![ToolCall::new("call_1", "transfer_to_C", "{}")])
            .await;
        provider.push_text("Hi, C here.").await;
        let agent_b = Agent::new("Agent B").tool(transfer_to_c());

        let result = orchestrator(&provider)
            .run_turn(&agent_b, &[Message::user("switch me")])
            .await
            .unwrap();

        assert_eq!(result.agent, agent_c());
        let tool_messages: Vec<_> = result
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(tool_messages.len(), 1);
        assert_eq!(
            tool_messages[0].content.as_deref(),
            Some("Transferred to Agent C. Adopt persona immediately.")
        );

        // the follow-up request already speaks as C
        let requests = provider.requests().await;
        assert_eq!(requests[1].messages[0], Message::system("You are C."));
        assert!(requests[1].tools.is_none());
    }

    #[tokio::test]
    async fn test_calls_after_handoff_use_previous_lookup() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_tool_calls(vec![
                ToolCall::new("call_1", "transfer_to_C", "{}"),
                ToolCall::new("call_2", "look_up_item", r#"{"search_query": "anvil"}"#),
            ])
            .await;
        provider.push_text("Done.").await;
        let agent = Agent::new("Agent B").tool(transfer_to_c()).tool(look_up_item());

        let result = orchestrator(&provider)
            .run_turn(&agent, &[Message::user("go")])
            .await
            .unwrap();

        assert_eq!(result.agent, agent_c());
        assert_eq!(result.messages[2], Message::tool("item_132612938", "call_2"));
    }

    #[tokio::test]
    async fn test_tool_failure_propagates_by_default() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_tool_calls(vec![ToolCall::new("call_1", "explode", "{}")])
            .await;
        provider.push_text("unreachable").await;
        let agent = Agent::new("A").tool(failing_tool());

        let err = orchestrator(&provider)
            .run_turn(&agent, &[Message::user("go")])
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ToolExecution { ref tool, .. } if tool == "explode"));
        assert_eq!(provider.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments_propagate() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_tool_calls(vec![ToolCall::new("call_1", "execute_refund", "{}")])
            .await;
        let agent = Agent::new("A").tool(look_up_item());
        let err = orchestrator(&provider)
            .run_turn(&agent, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(_)));

        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_tool_calls(vec![ToolCall::new("call_1", "look_up_item", "{oops")])
            .await;
        let err = orchestrator(&provider)
            .run_turn(&agent, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ArgumentDecode { .. }));
    }

    #[tokio::test]
    async fn test_report_policy_turns_failures_into_tool_messages() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_tool_calls(vec![
                ToolCall::new("call_1", "missing_tool", "{}"),
                ToolCall::new("call_2", "explode", "{}"),
            ])
            .await;
        provider.push_text("Sorry about that.").await;
        let recorder = Arc::new(Recorder::default());
        let orchestrator = OrchestratorBuilder::new()
            .provider(provider.clone())
            .observer(recorder.clone())
            .error_policy(ToolErrorPolicy::ReportToModel)
            .build()
            .unwrap();
        let agent = Agent::new("A").tool(failing_tool());

        let result = orchestrator.run_turn(&agent, &[]).await.unwrap();

        assert_eq!(result.messages.len(), 4);
        assert_eq!(
            result.messages[1],
            Message::tool("Error: Unknown tool: missing_tool", "call_1")
        );
        assert!(result.messages[2]
            .content
            .as_deref()
            .unwrap()
            .starts_with("Error: Tool 'explode' failed"));
        let errors = recorder
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, TurnEvent::ToolError { .. }))
            .count();
        assert_eq!(errors, 2);
    }

    #[tokio::test]
    async fn test_escalation_is_never_reported_to_model() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_tool_calls(vec![ToolCall::new("call_1", "escalate", "{}")])
            .await;
        let orchestrator = OrchestratorBuilder::new()
            .provider(provider.clone())
            .error_policy(ToolErrorPolicy::ReportToModel)
            .build()
            .unwrap();
        let agent = Agent::new("A").tool(FunctionTool::new(ToolSignature::new("escalate"), |_| {
            Err(AgentError::Escalated("customer asked".into()))
        }));

        let err = orchestrator.run_turn(&agent, &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::Escalated(_)));
    }

    #[tokio::test]
    async fn test_endpoint_error_propagates() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_error(AgentError::RateLimited("429".into()))
            .await;

        let err = orchestrator(&provider)
            .run_turn(&Agent::default(), &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let provider = Arc::new(ScriptedProvider::new());
        for i in 0..3 {
            provider
                .push_tool_calls(vec![ToolCall::new(
                    format!("call_{i}"),
                    "look_up_item",
                    r#"{"search_query": "x"}"#,
                )])
                .await;
        }
        let orchestrator = OrchestratorBuilder::new()
            .provider(provider.clone())
            .max_iterations(2)
            .build()
            .unwrap();

        let err = orchestrator
            .run_turn(&Agent::new("A").tool(look_up_item()), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations(2)));
        assert_eq!(provider.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_events_in_order() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_message(Message::assistant_tool_calls(
                Some("One moment.".into()),
                vec![ToolCall::new("call_1", "transfer_to_C", "{}")],
            ))
            .await;
        provider.push_text("C speaking.").await;
        let recorder = Arc::new(Recorder::default());
        let orchestrator = Orchestrator::with_defaults(provider.clone()).with_observer(recorder.clone());

        orchestrator
            .run_turn(&Agent::new("Agent B").tool(transfer_to_c()), &[])
            .await
            .unwrap();

        let events = recorder.0.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                TurnEvent::AssistantText {
                    agent: "Agent B".into(),
                    content: "One moment.".into()
                },
                TurnEvent::ToolCall {
                    agent: "Agent B".into(),
                    tool: "transfer_to_C".into(),
                    arguments: "{}".into()
                },
                TurnEvent::Handoff {
                    from: "Agent B".into(),
                    to: "Agent C".into()
                },
                TurnEvent::AssistantText {
                    agent: "Agent C".into(),
                    content: "C speaking.".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_citations_are_reported() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut completion = crate::provider::Completion::from_message(
            "sonar",
            Message::assistant("New Delhi."),
        );
        completion.citations = vec!["https://en.wikipedia.org/wiki/Delhi".into()];
        provider.push_completion(completion).await;
        let recorder = Arc::new(Recorder::default());

        Orchestrator::with_defaults(provider.clone())
            .with_observer(recorder.clone())
            .run_turn(&Agent::default().model("sonar"), &[Message::user("Capital of India?")])
            .await
            .unwrap();

        let events = recorder.0.lock().unwrap().clone();
        assert_eq!(
            events[0],
            TurnEvent::Citations {
                agent: "Agent".into(),
                urls: vec!["https://en.wikipedia.org/wiki/Delhi".into()]
            }
        );
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(
            OrchestratorBuilder::new().build(),
            Err(AgentError::Config(_))
        ));
    }
}
