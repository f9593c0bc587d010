//! Progressive tool orchestration for one chat turn

use std::fmt;
use std::sync::Arc;

use crate::config::OrchestratorSettings;
use crate::logging::Logger;
use crate::providers::{Provider, ProviderModelConfig, StreamChatOptions};
use crate::resolver::{CapabilityCandidate, CapabilityResolver};
use crate::tools::{CapabilityEntry, ToolRegistry};
use crate::types::{last_user_text, CancellationToken, ChatMessage, MessageContent, MessageRole, RequestContext};
use crate::{log_debug, log_error, log_info, log_warn};

use super::dispatcher::ToolDispatcher;
use super::error::{OrchestratorError, OrchestratorResult};
use super::scoping::scope_entries;
use super::state::{decide_route, OrchestrationState, Route};
use super::streaming::{OrchestrationStream, StreamingTurn};

/// Result of preparing a turn
pub struct OrchestrationOutput {
    /// Plan produced by the planning call, if one ran and succeeded
    pub plan: Option<String>,
    /// Tool names offered to the model
    pub scoped_tools: Vec<String>,
    /// States visited before streaming began
    pub trace: Vec<OrchestrationState>,
    /// Model updates and tool results; ends when the turn is done
    pub stream: OrchestrationStream,
}

impl fmt::Debug for OrchestrationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestrationOutput")
            .field("plan", &self.plan)
            .field("scoped_tools", &self.scoped_tools)
            .field("trace", &self.trace)
            .finish()
    }
}

const PLANNING_PROMPT: &str = "You are preparing to answer the conversation below. \
Before answering, decide which of the available tools are needed. \
Reply with a short plan naming the tools and the steps, in a few sentences. \
Do not answer the user and do not call any tool.";

/// Build the system prompt for the planning call
pub fn planning_prompt(entries: &[CapabilityEntry]) -> String {
    let mut prompt = String::from(PLANNING_PROMPT);
    prompt.push_str("\n\nAvailable tools:");
    for entry in entries {
        prompt.push_str(&format!("\n- {}: {}", entry.name, entry.description));
    }
    prompt
}

/// Render resolver candidates as a system prompt section
pub fn capability_block(candidates: &[CapabilityCandidate]) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }
    let mut block = String::from("Relevant capabilities from connected servers:");
    for c in candidates {
        block.push_str(&format!("\n- {} ({} {}): {}", c.name, c.source_label, c.kind, c.description));
    }
    Some(block)
}

/// Append `block` to the leading system message, adding one if needed
pub fn inject_system_context(messages: &mut Vec<ChatMessage>, block: &str) {
    match messages.first_mut() {
        Some(first) if first.role == MessageRole::System => {
            let existing = first.plain_text();
            first.content = MessageContent::Text(format!("{}\n\n{}", existing, block));
        }
        _ => messages.insert(0, ChatMessage::system(block)),
    }
}

struct Trace<'a> {
    states: Vec<OrchestrationState>,
    logger: &'a dyn Logger,
}

impl Trace<'_> {
    fn enter(&mut self, state: OrchestrationState) {
        log_debug!(self.logger, "[Orchestrator] -> {}", state);
        self.states.push(state);
    }

    fn current(&self) -> OrchestrationState {
        self.states.last().copied().unwrap_or(OrchestrationState::Start)
    }
}

/// Decides, per turn, which capabilities the model sees and drives the
/// completion
///
/// Stateless across turns; share one instance behind an `Arc`.
pub struct Orchestrator {
    registry: Arc<ToolRegistry>,
    provider: Arc<dyn Provider>,
    resolver: Option<Arc<CapabilityResolver>>,
    settings: OrchestratorSettings,
    logger: Arc<dyn Logger>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ToolRegistry>,
        provider: Arc<dyn Provider>,
        settings: OrchestratorSettings,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            registry,
            provider,
            resolver: None,
            settings,
            logger,
        }
    }

    /// Add remote capability hints to the system prompt of each turn
    pub fn with_resolver(mut self, resolver: Arc<CapabilityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Prepare and start one chat turn
    ///
    /// Returns once the final completion has started streaming. A failure to
    /// start that completion is returned here; later failures arrive as
    /// `Err` items on the stream.
    pub async fn run(
        &self,
        messages: Vec<ChatMessage>,
        context: &RequestContext,
        model: ProviderModelConfig,
        cancel: &CancellationToken,
    ) -> OrchestratorResult<OrchestrationOutput> {
        let mut trace = Trace {
            states: Vec::new(),
            logger: self.logger.as_ref(),
        };

        match self.run_turn(messages, context, model, cancel, &mut trace).await {
            Ok(output) => Ok(output),
            Err(e) => {
                let state = trace.current();
                if e.is_cancelled() {
                    log_debug!(self.logger, "[Orchestrator] Cancelled during {}", state);
                } else {
                    log_error!(self.logger, "[Orchestrator] Failed during {}: {}", state, e);
                }
                trace.enter(OrchestrationState::Failed);
                Err(e)
            }
        }
    }

    async fn run_turn(
        &self,
        mut messages: Vec<ChatMessage>,
        context: &RequestContext,
        model: ProviderModelConfig,
        cancel: &CancellationToken,
        trace: &mut Trace<'_>,
    ) -> OrchestratorResult<OrchestrationOutput> {
        trace.enter(OrchestrationState::Start);
        let entries = self.registry.get_all(context, cancel).await?;

        let route = decide_route(&entries, &self.settings);
        log_info!(
            self.logger,
            "[Orchestrator] {} capabilities, route {:?}",
            entries.len(),
            route
        );

        let mut plan = None;
        let scoped = match route {
            Route::Direct => {
                trace.enter(OrchestrationState::PlanningSkipped);
                entries
            }
            Route::ScopeOnly => {
                trace.enter(OrchestrationState::PlanningSkipped);
                trace.enter(OrchestrationState::Scoping);
                scope_entries(entries, None, &self.settings)
            }
            Route::PlanThenScope => {
                trace.enter(OrchestrationState::Planning);
                plan = self.plan(&messages, &entries, &model, cancel).await?;
                trace.enter(OrchestrationState::Scoping);
                scope_entries(entries, plan.as_deref(), &self.settings)
            }
        };

        if let Some(block) = self.capability_context(&messages, context, cancel).await? {
            inject_system_context(&mut messages, &block);
        }

        trace.enter(OrchestrationState::Streaming);
        let dispatcher = ToolDispatcher::new(scoped, Arc::clone(&self.logger));
        let scoped_tools = dispatcher.names();
        log_info!(
            self.logger,
            "[Orchestrator] Streaming with {} tools: {}",
            scoped_tools.len(),
            scoped_tools.join(", ")
        );

        let mut options = StreamChatOptions::new();
        if !dispatcher.is_empty() {
            options = options.with_tools(dispatcher.tools());
        }

        let first = self
            .provider
            .stream_chat(messages.clone(), model.clone(), options.clone(), cancel.clone())
            .await?;

        let turn = StreamingTurn {
            provider: Arc::clone(&self.provider),
            dispatcher,
            messages,
            model,
            options,
            cancel: cancel.clone(),
            max_rounds: self.settings.max_tool_rounds.max(1),
            logger: Arc::clone(&self.logger),
        };

        Ok(OrchestrationOutput {
            plan,
            scoped_tools,
            trace: trace.states.clone(),
            stream: turn.spawn(first),
        })
    }

    /// Ask the model for a short plan
    ///
    /// Any failure or timeout means no plan. Cancellation of the turn is the
    /// only error returned.
    async fn plan(
        &self,
        messages: &[ChatMessage],
        entries: &[CapabilityEntry],
        model: &ProviderModelConfig,
        cancel: &CancellationToken,
    ) -> OrchestratorResult<Option<String>> {
        let mut request = Vec::with_capacity(messages.len() + 1);
        request.push(ChatMessage::system(planning_prompt(entries)));
        request.extend(messages.iter().filter(|m| m.role != MessageRole::System).cloned());

        let options = StreamChatOptions::new().with_max_tokens(self.settings.planning_max_tokens);
        let budget = cancel.child_token();
        let call = self.provider.chat(request, model.clone(), options, budget.clone());

        let outcome = cancel
            .run_until_cancelled(tokio::time::timeout(self.settings.planning_timeout(), call))
            .await
            .ok_or(OrchestratorError::Cancelled)?;

        match outcome {
            Err(_) => {
                budget.cancel();
                log_warn!(
                    self.logger,
                    "[Orchestrator] Planning timed out after {}ms, continuing without a plan",
                    self.settings.planning_timeout_ms
                );
                Ok(None)
            }
            Ok(Err(e)) if e.is_cancelled() && cancel.is_cancelled() => Err(OrchestratorError::Cancelled),
            Ok(Err(e)) => {
                log_warn!(self.logger, "[Orchestrator] Planning failed, continuing without a plan: {}", e);
                Ok(None)
            }
            Ok(Ok(response)) => {
                let plan = response.text.trim();
                if plan.is_empty() {
                    log_debug!(self.logger, "[Orchestrator] Planning returned an empty plan");
                    Ok(None)
                } else {
                    log_debug!(self.logger, "[Orchestrator] Plan: {}", plan);
                    Ok(Some(plan.to_string()))
                }
            }
        }
    }

    /// System prompt section listing remote capabilities relevant to the
    /// latest user message
    async fn capability_context(
        &self,
        messages: &[ChatMessage],
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> OrchestratorResult<Option<String>> {
        let Some(resolver) = &self.resolver else {
            return Ok(None);
        };
        if context.remote_connection_ids.is_empty() {
            return Ok(None);
        }
        let Some(prompt) = last_user_text(messages) else {
            return Ok(None);
        };

        let candidates = resolver
            .resolve(
                &prompt,
                &context.provider_name,
                context.connection_name.as_deref(),
                &context.remote_connection_ids,
                cancel,
            )
            .await
            .map_err(|_| OrchestratorError::Cancelled)?;

        Ok(capability_block(&candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use futures::StreamExt;
    use serde_json::json;

    use crate::config::ResolverSettings;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::transport::testing::{connector, StaticTransport};
    use crate::mcp::{CachedCatalogProvider, McpCatalog, McpToolInfo};
    use crate::providers::{MockMode, MockProvider};
    use crate::tools::{ready_factory, CapabilityTool, FnTool, ToolError, ToolProvider};
    use crate::types::{StreamChunk, ToolCall};

    struct ListProvider {
        name: &'static str,
        entries: Vec<CapabilityEntry>,
    }

    #[async_trait]
    impl ToolProvider for ListProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn get_tools(
            &self,
            _context: &RequestContext,
            _cancel: &CancellationToken,
        ) -> Result<Vec<CapabilityEntry>, ToolError> {
            Ok(self.entries.clone())
        }
    }

    fn answer_tool() -> Arc<dyn CapabilityTool> {
        Arc::new(FnTool::new("lookup", |_| Ok("42".to_string())))
    }

    fn local(name: &str) -> CapabilityEntry {
        CapabilityEntry::local(name, format!("{} helper", name), None, answer_tool())
    }

    fn remote(name: &str, description: &str) -> CapabilityEntry {
        CapabilityEntry::remote("srv", name, description.to_string(), None, ready_factory(answer_tool()))
    }

    fn remote_catalog() -> Vec<CapabilityEntry> {
        let mut entries = vec![
            remote("createJiraTicket", "Create a ticket in Jira"),
            remote("updateJiraTicket", "Update an existing Jira ticket"),
        ];
        entries.extend((0..28).map(|i| remote(&format!("utility{}", i), "Unrelated helper")));
        entries
    }

    fn orchestrator(
        entries: Vec<CapabilityEntry>,
        provider: &Arc<MockProvider>,
        settings: OrchestratorSettings,
        logger: Arc<dyn Logger>,
    ) -> Orchestrator {
        let registry = ToolRegistry::new(Arc::clone(&logger)).with_provider(Arc::new(ListProvider {
            name: "test",
            entries,
        }));
        Orchestrator::new(
            Arc::new(registry),
            Arc::clone(provider) as Arc<dyn Provider>,
            settings,
            logger,
        )
    }

    fn model() -> ProviderModelConfig {
        ProviderModelConfig::new("mock-echo")
    }

    fn user(text: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::user(text)]
    }

    async fn collect(output: OrchestrationOutput) -> Vec<OrchestratorResult<StreamChunk>> {
        output.stream.collect().await
    }

    fn text_of(items: &[OrchestratorResult<StreamChunk>]) -> String {
        items
            .iter()
            .filter_map(|i| i.as_ref().ok())
            .filter_map(|c| c.as_text())
            .collect()
    }

    #[tokio::test]
    async fn test_small_local_set_streams_without_planning() {
        let provider = Arc::new(MockProvider::fixed("Sure.", Arc::new(NoOpLogger)));
        let orchestrator = orchestrator(
            vec![local("calculator"), local("clock"), local("lookup")],
            &provider,
            OrchestratorSettings::default(),
            Arc::new(NoOpLogger),
        );

        let output = orchestrator
            .run(user("What time is it?"), &RequestContext::new("mock"), model(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            output.trace,
            vec![
                OrchestrationState::Start,
                OrchestrationState::PlanningSkipped,
                OrchestrationState::Streaming
            ]
        );
        assert!(output.plan.is_none());
        let items = collect(output).await;
        assert_eq!(text_of(&items), "Sure.");

        assert_eq!(provider.request_count(), 1);
        assert_eq!(provider.requests()[0].tool_names, vec!["calculator", "clock", "lookup"]);
    }

    #[tokio::test]
    async fn test_mid_sized_set_scopes_without_plan() {
        let provider = Arc::new(MockProvider::fixed("ok", Arc::new(NoOpLogger)));
        let mut entries: Vec<_> = (0..3).map(|i| local(&format!("local{}", i))).collect();
        entries.extend((0..10).map(|i| {
            let description = if i == 9 { "Weather report".to_string() } else { format!("sys{} helper", i) };
            CapabilityEntry::system(&format!("sys{}", i), description, None, answer_tool())
        }));
        let settings = OrchestratorSettings {
            max_scoped_tools: 6,
            ..OrchestratorSettings::default()
        };
        let orchestrator = orchestrator(entries, &provider, settings, Arc::new(NoOpLogger));

        let output = orchestrator
            .run(user("Give me the weather report"), &RequestContext::new("mock"), model(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            output.trace,
            vec![
                OrchestrationState::Start,
                OrchestrationState::PlanningSkipped,
                OrchestrationState::Scoping,
                OrchestrationState::Streaming
            ]
        );
        assert!(output.plan.is_none());
        assert_eq!(
            output.scoped_tools,
            vec!["local0", "local1", "local2", "sys0", "sys1", "sys2"]
        );
        collect(output).await;
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_plan_scopes_remote_capabilities() {
        let provider = Arc::new(
            MockProvider::new(Arc::new(NoOpLogger)).with_script([
                MockMode::Fixed("Use createJiraTicket to file a Jira ticket".to_string()),
                MockMode::Fixed("Filed.".to_string()),
            ]),
        );
        let mut entries: Vec<_> = (0..5).map(|i| local(&format!("local{}", i))).collect();
        entries.extend(remote_catalog());
        let orchestrator = orchestrator(entries, &provider, OrchestratorSettings::default(), Arc::new(NoOpLogger));

        let output = orchestrator
            .run(
                user("Please open a Jira ticket for the outage"),
                &RequestContext::new("mock"),
                model(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(
            output.trace,
            vec![
                OrchestrationState::Start,
                OrchestrationState::Planning,
                OrchestrationState::Scoping,
                OrchestrationState::Streaming
            ]
        );
        assert_eq!(output.plan.as_deref(), Some("Use createJiraTicket to file a Jira ticket"));
        collect(output).await;

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);

        let planning = &requests[0];
        assert!(planning.tool_names.is_empty());
        assert_eq!(planning.max_tokens, Some(256));
        assert!(planning.messages[0].plain_text().contains("createJiraTicket"));

        let offered = &requests[1].tool_names;
        for i in 0..5 {
            assert!(offered.contains(&format!("local{}", i)));
        }
        assert!(offered.contains(&"createJiraTicket".to_string()));
        assert!(offered.contains(&"updateJiraTicket".to_string()));
        assert!(offered.len() < 35);
        assert!(!offered.contains(&"utility3".to_string()));
    }

    #[tokio::test]
    async fn test_failed_plan_still_offers_remote_tools() {
        let logger = Arc::new(MemoryLogger::new());
        let provider = Arc::new(MockProvider::new(Arc::new(NoOpLogger)).with_script([
            MockMode::Fail("planner down".to_string()),
            MockMode::Fixed("ok".to_string()),
        ]));
        let orchestrator = orchestrator(
            remote_catalog(),
            &provider,
            OrchestratorSettings::default(),
            Arc::clone(&logger) as Arc<dyn Logger>,
        );

        let output = orchestrator
            .run(user("help"), &RequestContext::new("mock"), model(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(output.plan.is_none());
        assert_eq!(output.scoped_tools.len(), 24);
        assert_eq!(output.scoped_tools[0], "createJiraTicket");
        collect(output).await;
        assert!(logger.contains(LogLevel::Warn, "Planning failed"));
        assert!(logger.messages_at(LogLevel::Error).is_empty());
    }

    #[tokio::test]
    async fn test_blank_plan_still_offers_remote_tools() {
        let provider = Arc::new(
            MockProvider::new(Arc::new(NoOpLogger)).with_script([MockMode::Empty, MockMode::Fixed("ok".to_string())]),
        );
        let orchestrator = orchestrator(remote_catalog(), &provider, OrchestratorSettings::default(), Arc::new(NoOpLogger));

        let output = orchestrator
            .run(user("help"), &RequestContext::new("mock"), model(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(output.plan.is_none());
        assert!(!output.scoped_tools.is_empty());
        collect(output).await;
        assert_eq!(provider.requests()[1].tool_names.len(), 24);
    }

    #[tokio::test]
    async fn test_planning_timeout_is_recoverable() {
        let logger = Arc::new(MemoryLogger::new());
        let provider = Arc::new(MockProvider::fixed("Slow plan", Arc::new(NoOpLogger)).with_initial_delay(200));
        let settings = OrchestratorSettings {
            planning_timeout_ms: 20,
            ..OrchestratorSettings::default()
        };
        let orchestrator = orchestrator(
            remote_catalog(),
            &provider,
            settings,
            Arc::clone(&logger) as Arc<dyn Logger>,
        );

        let output = orchestrator
            .run(user("help"), &RequestContext::new("mock"), model(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(output.plan.is_none());
        assert_eq!(output.scoped_tools.len(), 24);
        assert!(logger.contains(LogLevel::Warn, "timed out"));
    }

    #[tokio::test]
    async fn test_tool_calls_are_dispatched_and_fed_back() {
        let provider = Arc::new(MockProvider::new(Arc::new(NoOpLogger)).with_script([
            MockMode::ToolCalls {
                text: "Checking.".to_string(),
                calls: vec![ToolCall::new("c1", "lookup", json!({ "q": "answer" }))],
            },
            MockMode::Fixed("The answer is 42".to_string()),
        ]));
        let orchestrator = orchestrator(
            vec![local("calculator"), local("lookup")],
            &provider,
            OrchestratorSettings::default(),
            Arc::new(NoOpLogger),
        );

        let output = orchestrator
            .run(user("What is the answer?"), &RequestContext::new("mock"), model(), &CancellationToken::new())
            .await
            .unwrap();
        let items = collect(output).await;

        assert!(items.iter().all(|i| i.is_ok()));
        let results: Vec<_> = items
            .iter()
            .filter_map(|i| i.as_ref().ok())
            .filter_map(|c| c.as_tool_result())
            .collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].call_id, "c1");
        assert_eq!(results[0].content, "42");
        assert!(text_of(&items).ends_with("The answer is 42"));

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].tool_names, vec!["calculator", "lookup"]);
    }

    #[tokio::test]
    async fn test_tool_errors_do_not_end_the_stream() {
        let failing: Arc<dyn CapabilityTool> = Arc::new(FnTool::new("explode", |_| {
            Err(ToolError::execution_failed("explode", "kaboom"))
        }));
        let provider = Arc::new(MockProvider::new(Arc::new(NoOpLogger)).with_script([
            MockMode::ToolCalls {
                text: String::new(),
                calls: vec![
                    ToolCall::new("c1", "explode", json!({})),
                    ToolCall::new("c2", "nonexistent", json!({})),
                ],
            },
            MockMode::Fixed("Sorry, that failed.".to_string()),
        ]));
        let orchestrator = orchestrator(
            vec![CapabilityEntry::local("explode", "Always fails".to_string(), None, failing)],
            &provider,
            OrchestratorSettings::default(),
            Arc::new(NoOpLogger),
        );

        let output = orchestrator
            .run(user("try it"), &RequestContext::new("mock"), model(), &CancellationToken::new())
            .await
            .unwrap();
        let items = collect(output).await;

        let results: Vec<_> = items
            .iter()
            .filter_map(|i| i.as_ref().ok())
            .filter_map(|c| c.as_tool_result())
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_error));
        assert_eq!(text_of(&items), "Sorry, that failed.");
    }

    #[tokio::test]
    async fn test_tool_rounds_are_bounded() {
        let logger = Arc::new(MemoryLogger::new());
        let provider = Arc::new(MockProvider::with_config(
            crate::providers::MockConfig {
                mode: MockMode::ToolCalls {
                    text: String::new(),
                    calls: vec![ToolCall::new("c1", "lookup", json!({}))],
                },
                ..Default::default()
            },
            Arc::new(NoOpLogger),
        ));
        let settings = OrchestratorSettings {
            max_tool_rounds: 2,
            ..OrchestratorSettings::default()
        };
        let orchestrator = orchestrator(
            vec![local("lookup")],
            &provider,
            settings,
            Arc::clone(&logger) as Arc<dyn Logger>,
        );

        let output = orchestrator
            .run(user("loop"), &RequestContext::new("mock"), model(), &CancellationToken::new())
            .await
            .unwrap();
        collect(output).await;

        assert_eq!(provider.request_count(), 2);
        assert!(logger.contains(LogLevel::Warn, "Stopping after 2"));
    }

    #[tokio::test]
    async fn test_completion_failures_are_surfaced() {
        let logger = Arc::new(MemoryLogger::new());
        let provider = Arc::new(MockProvider::new(Arc::new(NoOpLogger)).with_script([MockMode::Fail(
            "backend unavailable".to_string(),
        )]));
        let orchestrator = orchestrator(
            vec![local("lookup")],
            &provider,
            OrchestratorSettings::default(),
            Arc::clone(&logger) as Arc<dyn Logger>,
        );

        let err = orchestrator
            .run(user("hi"), &RequestContext::new("mock"), model(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Provider(_)));
        assert!(logger.contains(LogLevel::Error, "Failed during streaming"));

        // Failures after streaming started arrive on the stream
        provider.push_script(MockMode::Error {
            message: "connection reset".to_string(),
            delay_chunks: 1,
        });
        let output = orchestrator
            .run(user("hi"), &RequestContext::new("mock"), model(), &CancellationToken::new())
            .await
            .unwrap();
        let items = collect(output).await;
        assert!(items[0].is_ok());
        assert!(matches!(items.last(), Some(Err(OrchestratorError::Provider(_)))));
    }

    #[tokio::test]
    async fn test_cancelled_turn_makes_no_calls() {
        let logger = Arc::new(MemoryLogger::new());
        let provider = Arc::new(MockProvider::fixed("never", Arc::new(NoOpLogger)));
        let orchestrator = orchestrator(
            remote_catalog(),
            &provider,
            OrchestratorSettings::default(),
            Arc::clone(&logger) as Arc<dyn Logger>,
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = orchestrator
            .run(user("help"), &RequestContext::new("mock"), model(), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(provider.request_count(), 0);
        assert!(logger.messages_at(LogLevel::Error).is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_during_stream() {
        let provider = Arc::new(MockProvider::chunked(
            vec!["one ".to_string(), "two ".to_string(), "three".to_string()],
            200,
            Arc::new(NoOpLogger),
        ));
        let orchestrator = orchestrator(
            vec![local("lookup")],
            &provider,
            OrchestratorSettings::default(),
            Arc::new(NoOpLogger),
        );
        let cancel = CancellationToken::new();

        let mut output = orchestrator
            .run(user("count"), &RequestContext::new("mock"), model(), &cancel)
            .await
            .unwrap();
        let first = output.stream.next().await.unwrap().unwrap();
        assert_eq!(first.as_text(), Some("one "));

        cancel.cancel();
        let rest: Vec<_> = output.stream.collect().await;
        assert!(matches!(rest.last(), Some(Err(e)) if e.is_cancelled()));
    }

    #[tokio::test]
    async fn test_relevant_remote_capabilities_injected_into_system_prompt() {
        let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
        let transport = Arc::new(StaticTransport::new().with_catalog(
            "jira",
            McpCatalog::with_tools(vec![McpToolInfo::new("createIssue", "Open a Jira issue")]),
        ));
        let catalogs = CachedCatalogProvider::new(connector(transport, &["jira"]), Duration::from_secs(60), Arc::clone(&logger));
        let resolver = CapabilityResolver::new(Arc::new(catalogs), ResolverSettings::default(), Arc::clone(&logger));

        let provider = Arc::new(MockProvider::fixed("ok", Arc::new(NoOpLogger)));
        let orchestrator = orchestrator(
            vec![local("lookup")],
            &provider,
            OrchestratorSettings::default(),
            Arc::clone(&logger),
        )
        .with_resolver(Arc::new(resolver));

        let messages = vec![ChatMessage::system("Be brief."), ChatMessage::user("file a bug")];
        let context = RequestContext::new("mock").with_remote_connections(["jira"]);
        let output = orchestrator
            .run(messages, &context, model(), &CancellationToken::new())
            .await
            .unwrap();
        collect(output).await;

        let request = &provider.requests()[0];
        assert_eq!(request.messages.len(), 2);
        let system = request.messages[0].plain_text();
        assert!(system.starts_with("Be brief."));
        assert!(system.contains("createIssue (jira tool): Open a Jira issue"));
    }

    #[test]
    fn test_inject_system_context_adds_message() {
        let mut messages = vec![ChatMessage::user("hi")];
        inject_system_context(&mut messages, "Context");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].plain_text(), "Context");
    }
}
