//! Events emitted while the ReAct loop runs.
//!
//! Serialized with a kebab-case `type` tag so a client can forward them as
//! server-sent events or newline-delimited JSON without remapping.

use serde::{Deserialize, Serialize};

/// Which phase of an iteration the agent is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStep {
    Thinking,
    Executing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AgentEvent {
    /// The loop is about to call the model or a tool.
    AgentStep { step: AgentStep, content: String },

    ToolCall {
        tool_name: String,
        tool_args: serde_json::Value,
        tool_id: String,
    },

    /// Tool output, truncated for display.
    ToolResult {
        tool_name: String,
        result: String,
        tool_id: String,
    },

    ToolError {
        tool_name: String,
        error: String,
        tool_id: String,
    },

    StreamStart,

    /// A slice of the final answer.
    StreamChunk { content: String },

    StreamEnd,

    /// Something the user should see went wrong; the loop has stopped.
    Error { content: String },
}

impl AgentEvent {
    /// Event name, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AgentStep { .. } => "agent-step",
            Self::ToolCall { .. } => "tool-call",
            Self::ToolResult { .. } => "tool-result",
            Self::ToolError { .. } => "tool-error",
            Self::StreamStart => "stream-start",
            Self::StreamChunk { .. } => "stream-chunk",
            Self::StreamEnd => "stream-end",
            Self::Error { .. } => "error",
        }
    }
}
