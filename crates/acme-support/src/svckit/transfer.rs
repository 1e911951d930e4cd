//! Transfer Tools
//!
//! Handoff tools: calling one returns the target agent, which the
//! orchestrator adopts as the active persona.

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{Agent, Result as CoreResult, Tool, ToolArgs, ToolOutput, tool::ToolSignature};

type AgentFactory = dyn Fn() -> Agent + Send + Sync;

/// Parameterless tool that hands off to another agent
///
/// The target is built when the tool runs, so agents may transfer to each
/// other in cycles.
pub struct TransferTool {
    name: String,
    doc: String,
    target: Arc<AgentFactory>,
}

impl TransferTool {
    pub fn new<F>(name: impl Into<String>, doc: impl Into<String>, target: F) -> Self
    where
        F: Fn() -> Agent + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            doc: doc.into(),
            target: Arc::new(target),
        }
    }
}

#[async_trait]
impl Tool for TransferTool {
    fn signature(&self) -> ToolSignature {
        ToolSignature::new(&self.name).doc(&self.doc)
    }

    async fn call(&self, _args: ToolArgs) -> CoreResult<ToolOutput> {
        Ok(ToolOutput::Handoff((self.target)()))
    }
}
