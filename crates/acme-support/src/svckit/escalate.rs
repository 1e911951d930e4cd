//! Escalation Tool

use async_trait::async_trait;

use agent_core::{
    AgentError, Result as CoreResult, Tool, ToolArgs, ToolOutput,
    tool::{Param, ToolSignature},
};

/// Hands the conversation to a human by ending the turn with [`AgentError::Escalated`]
pub struct EscalateToHumanTool;

#[async_trait]
impl Tool for EscalateToHumanTool {
    fn signature(&self) -> ToolSignature {
        ToolSignature::new("escalate_to_human")
            .doc("Only call this if explicitly asked to.")
            .param(Param::new("summary"))
    }

    async fn call(&self, args: ToolArgs) -> CoreResult<ToolOutput> {
        let summary = args.string("summary")?;
        tracing::info!(summary = %summary, "Escalating to human agent");
        Err(AgentError::Escalated(summary))
    }
}
