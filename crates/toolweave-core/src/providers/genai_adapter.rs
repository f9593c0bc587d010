//! Conversions between crate types and `genai` types

use std::future::Future;
use std::pin::Pin;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatRole as GenaiRole, ChatStreamEvent,
    MessageContent as GenaiContent, Tool as GenaiTool, ToolCall as GenaiToolCall,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};

use crate::types::{ChatMessage, ContentPart, MessageContent, MessageRole, StreamChunk, Tool, ToolCall};

use super::error::ProviderError;
use super::traits::StreamChatOptions;

pub fn to_genai_role(role: MessageRole) -> GenaiRole {
    match role {
        MessageRole::System => GenaiRole::System,
        MessageRole::User => GenaiRole::User,
        MessageRole::Assistant => GenaiRole::Assistant,
    }
}

/// Render a part as text
///
/// Tool calls and results are replayed as text so a conversation that went
/// through the tool loop can be sent to any backend.
fn part_text(part: ContentPart) -> String {
    match part {
        ContentPart::Text { text } => text,
        ContentPart::ToolUse { id, name, input } => format!("[Tool call {} {}]: {}", id, name, input),
        ContentPart::ToolResult { tool_use_id, content } => {
            format!("[Tool result for {}]: {}", tool_use_id, content)
        }
    }
}

pub fn to_genai_message(msg: ChatMessage) -> GenaiMessage {
    let content = match msg.content {
        MessageContent::Text(text) => GenaiContent::from(text),
        MessageContent::Parts(parts) => GenaiContent::from(
            parts.into_iter().map(part_text).collect::<Vec<_>>().join("\n"),
        ),
    };

    match msg.role {
        MessageRole::System => GenaiMessage::system(content),
        MessageRole::User => GenaiMessage::user(content),
        MessageRole::Assistant => GenaiMessage::assistant(content),
    }
}

pub fn to_genai_messages(messages: Vec<ChatMessage>) -> Vec<GenaiMessage> {
    messages.into_iter().map(to_genai_message).collect()
}

pub fn to_genai_tool(tool: Tool) -> GenaiTool {
    let mut genai_tool = GenaiTool::new(&tool.name).with_description(&tool.description);

    if let Some(schema) = tool.input_schema {
        genai_tool = genai_tool.with_schema(schema);
    }

    genai_tool
}

pub fn to_genai_tools(tools: Vec<Tool>) -> Vec<GenaiTool> {
    tools.into_iter().map(to_genai_tool).collect()
}

pub fn to_genai_options(options: &StreamChatOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    // Tool calls are only reported at the end of the stream when captured
    genai_opts.with_capture_tool_calls(true)
}

pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall {
        id: tc.call_id.clone(),
        name: tc.fn_name.clone(),
        input: tc.fn_arguments.clone(),
    }
}

/// Chunks produced by one stream event
pub fn from_genai_event(event: ChatStreamEvent) -> Vec<Result<StreamChunk, ProviderError>> {
    match event {
        ChatStreamEvent::Chunk(chunk) => vec![Ok(StreamChunk::text(chunk.content))],
        ChatStreamEvent::ToolCallChunk(chunk) => vec![Ok(StreamChunk::ToolCallDelta {
            id: chunk.tool_call.call_id,
            name: Some(chunk.tool_call.fn_name),
            input_delta: Some(chunk.tool_call.fn_arguments.to_string()),
        })],
        ChatStreamEvent::End(end) => match end.captured_tool_calls() {
            Some(calls) => calls
                .iter()
                .map(|tc| Ok(StreamChunk::tool_call(from_genai_tool_call(tc))))
                .collect(),
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Routing information for one request
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier (e.g., "openai", "azure", "openrouter")
    pub provider: String,
    /// Explicit API key; genai's own lookup is used when absent
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

/// Create a genai client that uses the explicit key and endpoint
pub fn create_client(config: &ProviderConfig) -> Client {
    let explicit_key = config.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |_model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let explicit_key = explicit_key.clone();
            Box::pin(async move { Ok(explicit_key.map(AuthData::from_single)) })
        },
    );

    let target_provider = config.provider.to_lowercase();
    let target_api_base = config.api_base.clone();

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let custom = target_api_base.as_ref().map(|u| Endpoint::from_owned(u.clone()));

            let (endpoint, adapter_kind) = match target_provider.as_str() {
                "azure" | "redhat" => match custom {
                    Some(ep) => (ep, AdapterKind::OpenAI),
                    None => return Ok(target),
                },
                "openrouter" => (
                    custom.unwrap_or_else(|| Endpoint::from_static("https://openrouter.ai/api/v1/")),
                    AdapterKind::OpenAI,
                ),
                "mistral" => (
                    custom.unwrap_or_else(|| Endpoint::from_static("https://api.mistral.ai/v1/")),
                    AdapterKind::OpenAI,
                ),
                _ => match custom {
                    Some(ep) => (ep, target.model.adapter_kind),
                    None => return Ok(target),
                },
            };

            let model = ModelIden::new(adapter_kind, target.model.model_name.clone());
            Ok(ServiceTarget {
                endpoint,
                auth: target.auth,
                model,
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}

/// Check if a provider is natively supported by genai
pub fn is_genai_native(provider: &str) -> bool {
    matches!(
        provider.to_lowercase().as_str(),
        "openai" | "anthropic" | "gemini" | "ollama" | "groq" | "xai" | "deepseek" | "cohere" | "fireworks" | "together"
    )
}

/// Check if a provider can be handled by genai (native or via OpenAI-compat)
pub fn is_genai_supported(provider: &str) -> bool {
    is_genai_native(provider)
        || matches!(
            provider.to_lowercase().as_str(),
            "azure" | "openrouter" | "mistral" | "redhat"
        )
}
