//! Agent Personas
//!
//! An [`Agent`] is a value: a name, a model, an instruction string and an
//! ordered tool list. The orchestrator never changes an agent; a handoff
//! swaps which agent is current.

use std::sync::Arc;

use crate::error::Result;
use crate::tool::{Tool, ToolRegistry, ToolSchema};

const DEFAULT_NAME: &str = "Agent";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_INSTRUCTIONS: &str = "You are a helpful Agent";

/// A named persona with its own instructions, model and tools
#[derive(Clone)]
pub struct Agent {
    /// Display label
    pub name: String,

    /// Backing model identifier, opaque to the orchestrator
    pub model: String,

    /// Sent as the system message on every completion call for this agent
    pub instructions: String,

    /// Callable tools, in insertion order
    pub tools: Vec<Arc<dyn Tool>>,
}

impl Default for Agent {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.into(),
            model: DEFAULT_MODEL.into(),
            instructions: DEFAULT_INSTRUCTIONS.into(),
            tools: Vec::new(),
        }
    }
}

impl Agent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    /// Schemas for every tool, in tool order
    pub fn tool_schemas(&self) -> Result<Vec<ToolSchema>> {
        self.tools.iter().map(|t| t.signature().schema()).collect()
    }

    /// Name lookup over this agent's tools
    pub fn registry(&self) -> ToolRegistry {
        ToolRegistry::from_tools(&self.tools)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("tools", &self.tool_names())
            .finish_non_exhaustive()
    }
}

/// Agents compare by persona and tool names; tool behaviour is not comparable.
impl PartialEq for Agent {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.model == other.model
            && self.instructions == other.instructions
            && self.tool_names() == other.tool_names()
    }
}
