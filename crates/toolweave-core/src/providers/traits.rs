//! Provider trait definition

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

use crate::types::{
    CancellationToken, ChatMessage, ProviderMetadata, StreamChunk, Tool, ToolCall, ToolChoice,
};
use super::error::{ProviderError, ProviderResult};

/// Model configuration for provider requests
#[derive(Debug, Clone)]
pub struct ProviderModelConfig {
    /// Model identifier as used by the provider's API
    pub model: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

impl ProviderModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

/// Options for chat requests
#[derive(Debug, Clone, Default)]
pub struct StreamChatOptions {
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Stop sequences
    pub stop: Option<Vec<String>>,
    /// Tools available for the model to use
    pub tools: Option<Vec<Tool>>,
    /// Tool choice behavior
    pub tool_choice: Option<ToolChoice>,
}

impl StreamChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Names of the tools offered, in order
    pub fn tool_names(&self) -> Vec<String> {
        self.tools
            .iter()
            .flatten()
            .map(|t| t.name.clone())
            .collect()
    }
}

/// Type alias for the streaming response
pub type StreamResponse = Pin<Box<dyn Stream<Item = ProviderResult<StreamChunk>> + Send>>;

/// A complete, non-streamed response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Chat completion backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g., "openai", "mock")
    fn name(&self) -> &str;

    fn metadata(&self) -> ProviderMetadata;

    /// Stream a chat completion
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: StreamChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse>;

    /// Complete a chat without streaming
    ///
    /// The default drains `stream_chat`.
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: StreamChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<ChatResponse> {
        let mut stream = self
            .stream_chat(messages, model, options, cancel_token.clone())
            .await?;

        let mut response = ChatResponse::default();
        while let Some(chunk) = stream.next().await {
            if cancel_token.is_cancelled() {
                return Err(ProviderError::Cancelled);
            }
            match chunk? {
                StreamChunk::Text { text } => response.text.push_str(&text),
                StreamChunk::ToolCall { tool_call } => response.tool_calls.push(tool_call),
                StreamChunk::ToolCallDelta { .. } | StreamChunk::ToolResult { .. } => {}
            }
        }
        if cancel_token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        Ok(response)
    }
}
