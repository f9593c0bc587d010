//! Streaming response types

use serde::{Deserialize, Serialize};
use super::tool::{ToolCall, ToolResult};

/// Streaming chunk from an LLM response
///
/// `ToolResult` chunks never come from a provider; the orchestrator appends
/// them after dispatching a `ToolCall`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamChunk {
    /// Text content chunk
    Text {
        text: String,
    },
    /// Complete tool call
    ToolCall {
        #[serde(rename = "toolCall")]
        tool_call: ToolCall,
    },
    /// Partial tool call (for streaming tool arguments)
    ToolCallDelta {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(rename = "inputDelta", skip_serializing_if = "Option::is_none")]
        input_delta: Option<String>,
    },
    /// Outcome of a dispatched tool call
    ToolResult {
        result: ToolResult,
    },
}

impl StreamChunk {
    /// Create a text chunk
    pub fn text(text: impl Into<String>) -> Self {
        StreamChunk::Text { text: text.into() }
    }

    /// Create a tool call chunk
    pub fn tool_call(tool_call: ToolCall) -> Self {
        StreamChunk::ToolCall { tool_call }
    }

    /// Create a tool result chunk
    pub fn tool_result(result: ToolResult) -> Self {
        StreamChunk::ToolResult { result }
    }

    /// Get the text content if this is a text chunk
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StreamChunk::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Get the tool call if this is a tool call chunk
    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            StreamChunk::ToolCall { tool_call } => Some(tool_call),
            _ => None,
        }
    }

    /// Get the tool result if this is a tool result chunk
    pub fn as_tool_result(&self) -> Option<&ToolResult> {
        match self {
            StreamChunk::ToolResult { result } => Some(result),
            _ => None,
        }
    }
}
