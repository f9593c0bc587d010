//! The streaming phase: completion rounds and tool dispatch

use std::pin::Pin;
use std::sync::Arc;

use futures::channel::mpsc;
use futures::{SinkExt, Stream, StreamExt};

use crate::logging::Logger;
use crate::providers::{Provider, ProviderModelConfig, StreamChatOptions, StreamResponse};
use crate::types::{CancellationToken, ChatMessage, StreamChunk};
use crate::{log_debug, log_warn};

use super::dispatcher::ToolDispatcher;
use super::error::{OrchestratorError, OrchestratorResult};

/// Updates of a turn: model chunks as received, plus a `ToolResult` chunk
/// for every dispatched call
pub type OrchestrationStream = Pin<Box<dyn Stream<Item = OrchestratorResult<StreamChunk>> + Send>>;

const CHANNEL_CAPACITY: usize = 32;

/// Everything the background streaming task owns
pub(crate) struct StreamingTurn {
    pub provider: Arc<dyn Provider>,
    pub dispatcher: ToolDispatcher,
    pub messages: Vec<ChatMessage>,
    pub model: ProviderModelConfig,
    pub options: StreamChatOptions,
    pub cancel: CancellationToken,
    pub max_rounds: usize,
    pub logger: Arc<dyn Logger>,
}

type Sender = mpsc::Sender<OrchestratorResult<StreamChunk>>;

impl StreamingTurn {
    /// Drive the turn on a spawned task, starting from an already open stream
    pub fn spawn(self, first: StreamResponse) -> OrchestrationStream {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(self.drive(first, tx));
        Box::pin(rx)
    }

    async fn drive(mut self, first: StreamResponse, mut tx: Sender) {
        let mut stream = first;
        let mut round = 1;

        loop {
            let mut text = String::new();
            let mut calls = Vec::new();

            while let Some(item) = stream.next().await {
                let chunk = match item {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(Err(e.into())).await;
                        return;
                    }
                };
                match &chunk {
                    StreamChunk::Text { text: t } => text.push_str(t),
                    StreamChunk::ToolCall { tool_call } => calls.push(tool_call.clone()),
                    StreamChunk::ToolCallDelta { .. } | StreamChunk::ToolResult { .. } => {}
                }
                if tx.send(Ok(chunk)).await.is_err() {
                    log_debug!(self.logger, "[Orchestrator] Receiver dropped, ending turn");
                    return;
                }
            }

            if self.cancel.is_cancelled() {
                let _ = tx.send(Err(OrchestratorError::Cancelled)).await;
                return;
            }
            if calls.is_empty() {
                log_debug!(self.logger, "[Orchestrator] Done after {} round(s)", round);
                return;
            }

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                match self.dispatcher.dispatch(call, &self.cancel).await {
                    Ok(result) => {
                        if tx.send(Ok(StreamChunk::tool_result(result.clone()))).await.is_err() {
                            return;
                        }
                        results.push(result);
                    }
                    Err(_) => {
                        let _ = tx.send(Err(OrchestratorError::Cancelled)).await;
                        return;
                    }
                }
            }

            if round >= self.max_rounds {
                log_warn!(
                    self.logger,
                    "[Orchestrator] Stopping after {} tool round(s) with calls still pending",
                    round
                );
                return;
            }

            self.messages.push(ChatMessage::assistant_tool_calls(&text, &calls));
            self.messages.push(ChatMessage::tool_results(&results));
            round += 1;

            stream = match self
                .provider
                .stream_chat(
                    self.messages.clone(),
                    self.model.clone(),
                    self.options.clone(),
                    self.cancel.clone(),
                )
                .await
            {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = tx.send(Err(e.into())).await;
                    return;
                }
            };
        }
    }
}
