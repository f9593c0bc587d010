//! Mock provider for testing
//!
//! Deterministic, configurable responses without network dependencies. Each
//! call can be scripted individually and every request is recorded so tests
//! can check exactly what the model was offered.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::{Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};
use crate::logging::Logger;
use crate::types::{
    last_user_text, CancellationToken, ChatMessage, DefaultModel, ModelCapabilities, ProviderMetadata,
    StreamChunk, ToolCall,
};
use crate::log_debug;

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Return response as specific chunks
    Chunks(Vec<String>),
    /// Stream an error after some chunks
    Error { message: String, delay_chunks: usize },
    /// Fail the call itself before any stream is returned
    Fail(String),
    /// Return nothing (empty response)
    Empty,
    /// Request tool calls, optionally after some text
    ToolCalls { text: String, calls: Vec<ToolCall> },
}

/// Configuration for the mock provider
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Mode used when the script is empty
    pub mode: MockMode,
    /// Delay before the first chunk in milliseconds
    pub initial_delay_ms: u64,
    /// Delay between chunks in milliseconds (0 = no delay)
    pub chunk_delay_ms: u64,
    /// Size of each chunk when splitting fixed/echo responses
    pub chunk_size: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            mode: MockMode::Echo,
            initial_delay_ms: 0,
            chunk_delay_ms: 0,
            chunk_size: 10,
        }
    }
}

/// What the mock was asked, one entry per call
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub tool_names: Vec<String>,
    pub max_tokens: Option<u32>,
}

/// Mock LLM provider for testing
pub struct MockProvider {
    config: MockConfig,
    script: Mutex<VecDeque<MockMode>>,
    requests: Mutex<Vec<MockRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_config(MockConfig::default(), logger)
    }

    pub fn with_config(config: MockConfig, logger: Arc<dyn Logger>) -> Self {
        Self {
            config,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Echo provider (echoes back user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::new(logger)
    }

    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Fixed(response.into()),
                ..Default::default()
            },
            logger,
        )
    }

    pub fn chunked(chunks: Vec<String>, delay_ms: u64, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Chunks(chunks),
                chunk_delay_ms: delay_ms,
                ..Default::default()
            },
            logger,
        )
    }

    pub fn error(message: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::with_config(
            MockConfig {
                mode: MockMode::Error {
                    message: message.into(),
                    delay_chunks: 0,
                },
                ..Default::default()
            },
            logger,
        )
    }

    /// Queue modes for the next calls, in order
    pub fn with_script(self, modes: impl IntoIterator<Item = MockMode>) -> Self {
        self.script.lock().extend(modes);
        self
    }

    /// Queue one more mode
    pub fn push_script(&self, mode: MockMode) {
        self.script.lock().push_back(mode);
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.config.chunk_delay_ms = delay_ms;
        self
    }

    /// Wait before the first chunk; used to exercise timeouts
    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.config.initial_delay_ms = delay_ms;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn split_into_chunks(&self, text: &str) -> Vec<String> {
        if self.config.chunk_size == 0 || text.is_empty() {
            return vec![text.to_string()];
        }

        text.chars()
            .collect::<Vec<_>>()
            .chunks(self.config.chunk_size)
            .map(|c| c.iter().collect())
            .collect()
    }

    fn next_mode(&self) -> MockMode {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.config.mode.clone())
    }

    fn text_chunks(&self, text: &str) -> Vec<ProviderResult<StreamChunk>> {
        self.split_into_chunks(text)
            .into_iter()
            .filter(|c| !c.is_empty())
            .map(|c| Ok(StreamChunk::text(c)))
            .collect()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "mock".to_string(),
            display_name: "Mock Provider".to_string(),
            requires_api_key: false,
            default_models: vec![DefaultModel {
                id: "mock-echo".to_string(),
                name: "Mock Echo".to_string(),
                context_length: 128000,
                capabilities: ModelCapabilities::full(),
            }],
        }
    }

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: ProviderModelConfig,
        options: StreamChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        let mode = self.next_mode();
        log_debug!(
            self.logger,
            "[MockProvider] stream_chat: {} messages, {} tools, mode {:?}",
            messages.len(),
            options.tools.as_ref().map_or(0, |t| t.len()),
            mode
        );

        let user_text = last_user_text(&messages);
        self.requests.lock().push(MockRequest {
            messages,
            model: model.model,
            tool_names: options.tool_names(),
            max_tokens: options.max_tokens,
        });

        let items: Vec<ProviderResult<StreamChunk>> = match mode {
            MockMode::Echo => {
                let text = user_text.unwrap_or_else(|| "Hello from MockProvider!".to_string());
                self.text_chunks(&format!("Echo: {}", text))
            }
            MockMode::Fixed(response) => self.text_chunks(&response),
            MockMode::Chunks(chunks) => chunks.into_iter().map(|c| Ok(StreamChunk::text(c))).collect(),
            MockMode::Empty => Vec::new(),
            MockMode::Fail(message) => {
                return Err(ProviderError::api_error("mock", 500, message));
            }
            MockMode::Error { message, delay_chunks } => {
                let mut items: Vec<_> = (0..delay_chunks)
                    .map(|i| Ok(StreamChunk::text(format!("Chunk {} before error. ", i))))
                    .collect();
                items.push(Err(ProviderError::Other(format!("Mock error: {}", message))));
                items
            }
            MockMode::ToolCalls { text, calls } => {
                let mut items = self.text_chunks(&text);
                items.extend(calls.into_iter().map(|c| Ok(StreamChunk::tool_call(c))));
                items
            }
        };

        let initial_delay_ms = self.config.initial_delay_ms;
        let delay_ms = self.config.chunk_delay_ms;

        let stream = stream::iter(items.into_iter().enumerate()).then(move |(i, item)| {
            let cancel = cancel_token.clone();
            async move {
                let delay = if i == 0 { initial_delay_ms } else { delay_ms };
                if delay > 0 {
                    if cancel
                        .run_until_cancelled(tokio::time::sleep(Duration::from_millis(delay)))
                        .await
                        .is_none()
                    {
                        return Err(ProviderError::Cancelled);
                    }
                }
                if cancel.is_cancelled() {
                    return Err(ProviderError::Cancelled);
                }
                item
            }
        });

        Ok(Box::pin(stream))
    }
}
