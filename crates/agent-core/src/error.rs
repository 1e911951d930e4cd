//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Tool signature could not be turned into a schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// Model requested a tool the current agent does not carry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool call arguments were not a JSON object
    #[error("Invalid arguments for tool '{tool}': {source}")]
    ArgumentDecode {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    /// Tool failed while binding arguments or running
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// Completion endpoint returned an error
    #[error("Endpoint error: {0}")]
    Endpoint(String),

    /// Endpoint unreachable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A tool asked for a human to take over the conversation
    #[error("Escalated to a human: {0}")]
    Escalated(String),

    /// Configured round-trip limit reached
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Shorthand for a tool execution failure
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::RateLimited(_) | Self::Io(_)
        )
    }

    /// Failures that originate from resolving, decoding or running a tool call.
    pub const fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool(_) | Self::ArgumentDecode { .. } | Self::ToolExecution { .. }
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Endpoint(msg) => format!("The AI service encountered an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::UnknownTool(name) => format!("The tool '{name}' is not available."),
            Self::ArgumentDecode { tool, .. } => {
                format!("The assistant sent malformed input to '{tool}'.")
            }
            Self::ToolExecution { tool, message } => format!("Tool '{tool}' failed: {message}"),
            Self::MaxIterations(_) => {
                "The request took too long to process. Please try a simpler query.".into()
            }
            Self::RateLimited(_) => "You've made too many requests. Please wait a moment.".into(),
            Self::Auth(_) => "Authentication failed. Please check your API key.".into(),
            Self::Escalated(_) => "You are being transferred to a human agent.".into(),
            Self::Config(msg) => format!("Configuration problem: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
