//! Chat message types

use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolResult};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A chat message for LLM requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender
    pub role: MessageRole,
    /// The content of the message (string or structured parts)
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a message with structured content parts
    pub fn with_parts(role: MessageRole, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
        }
    }

    /// Assistant turn that requested the given tool calls, with any text it streamed first
    pub fn assistant_tool_calls(text: &str, calls: &[ToolCall]) -> Self {
        let mut parts = Vec::with_capacity(calls.len() + 1);
        if !text.is_empty() {
            parts.push(ContentPart::text(text));
        }
        parts.extend(
            calls
                .iter()
                .map(|c| ContentPart::tool_use(c.id.clone(), c.name.clone(), c.input.clone())),
        );
        Self::with_parts(MessageRole::Assistant, parts)
    }

    /// User turn carrying tool results back to the model
    pub fn tool_results(results: &[ToolResult]) -> Self {
        let parts = results
            .iter()
            .map(|r| ContentPart::tool_result(r.call_id.clone(), r.content.clone()))
            .collect();
        Self::with_parts(MessageRole::User, parts)
    }

    /// Get the text content if this is a simple text message
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(s) => Some(s),
            MessageContent::Parts(_) => None,
        }
    }

    /// All text in the message, joining text parts with newlines
    pub fn plain_text(&self) -> String {
        match &self.content {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Text of the most recent user message that has any text
pub fn last_user_text(messages: &[ChatMessage]) -> Option<String> {
    messages
        .iter()
        .rev()
        .filter(|m| m.role == MessageRole::User)
        .map(ChatMessage::plain_text)
        .find(|t| !t.trim().is_empty())
}

/// Message content - either simple text or structured parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content with multiple parts
    Parts(Vec<ContentPart>),
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

/// Content part for tool messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text {
        text: String,
    },
    /// Tool use (assistant calling a tool)
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Tool result (returning tool output)
    ToolResult {
        #[serde(rename = "tool_use_id")]
        tool_use_id: String,
        content: String,
    },
}

impl ContentPart {
    /// Create a text content part
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Create a tool use content part
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        ContentPart::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Create a tool result content part
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        ContentPart::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_message_creation() {
        let sys = ChatMessage::system("You are helpful");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.text(), Some("You are helpful"));

        let asst = ChatMessage::assistant("Hi there!");
        assert_eq!(asst.role, MessageRole::Assistant);
    }

    #[test]
    fn test_last_user_text_skips_tool_results() {
        let messages = vec![
            ChatMessage::user("Create a Jira ticket"),
            ChatMessage::assistant_tool_calls(
                "",
                &[ToolCall::new("c1", "createJiraTicket", json!({}))],
            ),
            ChatMessage::tool_results(&[ToolResult::success("c1", "PROJ-1")]),
        ];

        assert_eq!(last_user_text(&messages).as_deref(), Some("Create a Jira ticket"));
        assert_eq!(last_user_text(&[]), None);
    }

    #[test]
    fn test_assistant_tool_calls_parts() {
        let msg = ChatMessage::assistant_tool_calls(
            "Let me check.",
            &[ToolCall::new("c1", "lookup", json!({"q": "x"}))],
        );
        match msg.content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(matches!(parts[1], ContentPart::ToolUse { .. }));
            }
            MessageContent::Text(_) => panic!("expected parts"),
        }
    }

    #[test]
    fn test_message_serialization() {
        let msg = ChatMessage::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"Hello\""));
    }
}
