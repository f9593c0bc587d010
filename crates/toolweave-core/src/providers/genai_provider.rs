//! Provider backed by the `genai` crate
//!
//! Handles every genai-native backend plus OpenAI-compatible ones (Azure,
//! OpenRouter, Mistral, Red Hat AI) through a service target resolver.

use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::sync::Arc;

use genai::chat::ChatRequest;

use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage, DefaultModel, ModelCapabilities, ProviderMetadata};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_event, is_genai_supported, to_genai_messages, to_genai_options, to_genai_tools,
    ProviderConfig,
};
use super::traits::{Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};
use crate::{log_error, log_info};

pub struct GenaiProvider {
    provider_id: String,
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    pub fn new(provider_id: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider_id: provider_id.into(),
            logger,
        }
    }

    /// Check if this provider can handle the given provider ID
    pub fn supports(provider_id: &str) -> bool {
        is_genai_supported(provider_id)
    }

    /// Model name without a provider prefix ("openai/gpt-4o" -> "gpt-4o")
    pub fn extract_model_name(model: &str) -> &str {
        model.split_once('/').map_or(model, |(_, name)| name)
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.provider_id
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: self.provider_id.clone(),
            display_name: self.provider_id.clone(),
            requires_api_key: !matches!(self.provider_id.as_str(), "ollama"),
            default_models: vec![DefaultModel {
                id: "default".to_string(),
                name: "Default Model".to_string(),
                context_length: 128000,
                capabilities: ModelCapabilities::full(),
            }],
        }
    }

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model_config: ProviderModelConfig,
        options: StreamChatOptions,
        cancel_token: CancellationToken,
    ) -> ProviderResult<StreamResponse> {
        let config = ProviderConfig {
            provider: self.provider_id.clone(),
            api_key: model_config.api_key.clone(),
            api_base: model_config.api_base.clone(),
        };
        let client = create_client(&config);

        let mut chat_req = ChatRequest::new(to_genai_messages(messages));
        if let Some(tools) = &options.tools {
            chat_req = chat_req.with_tools(to_genai_tools(tools.clone()));
        }
        let genai_options = to_genai_options(&options);
        let model_name = Self::extract_model_name(&model_config.model);

        log_info!(
            self.logger,
            "[GenaiProvider] Starting stream: provider={}, model={}, tools={}",
            self.provider_id,
            model_name,
            options.tools.as_ref().map_or(0, |t| t.len())
        );

        let started = cancel_token
            .run_until_cancelled(client.exec_chat_stream(model_name, chat_req, Some(&genai_options)))
            .await
            .ok_or(ProviderError::Cancelled)?;
        let chat_stream = started.map_err(|e| ProviderError::api_error(&self.provider_id, 500, e.to_string()))?;

        let logger = Arc::clone(&self.logger);
        let provider_id = self.provider_id.clone();

        let stream = chat_stream.stream.flat_map(move |result| {
            if cancel_token.is_cancelled() {
                return stream::iter(vec![Err(ProviderError::Cancelled)]);
            }
            let chunks = match result {
                Ok(event) => from_genai_event(event),
                Err(e) => {
                    log_error!(logger, "[GenaiProvider] Stream error: {}", e);
                    vec![Err(ProviderError::api_error(&provider_id, 500, e.to_string()))]
                }
            };
            stream::iter(chunks)
        });

        Ok(Box::pin(stream))
    }
}
