//! Toolweave Core
//!
//! Decides, for every chat turn, which callable capabilities a language model
//! is offered: configured local tools, gated system tools, and tools proxied
//! from remote Model Context Protocol servers.
//!
//! ## Progressive Orchestration
//!
//! The `orchestrator` module aggregates every capability source, decides
//! whether a cheap relevance filter is enough or a planning call is needed,
//! scopes the set and streams the completion, dispatching tool calls as the
//! model makes them.
//!
//! ```rust,ignore
//! use toolweave_core::orchestrator::Orchestrator;
//!
//! let registry = ToolRegistry::new(logger.clone())
//!     .with_provider(Arc::new(LocalToolProvider::new(global_definitions())))
//!     .with_provider(Arc::new(SystemToolProvider::new(global_definitions())))
//!     .with_provider(Arc::new(RemoteToolProvider::new(catalogs, connector, logger.clone())));
//!
//! let orchestrator = Orchestrator::new(Arc::new(registry), provider, settings, logger);
//! let output = orchestrator.run(messages, &context, model, &cancel).await?;
//! while let Some(chunk) = output.stream.next().await {
//!     // forward to the client
//! }
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod text;
pub mod providers;
pub mod mcp;
pub mod embeddings;
pub mod tools;
pub mod resolver;
pub mod orchestrator;

// Re-export commonly used types
pub use types::{
    ChatMessage, ContentPart, MessageRole, MessageContent,
    ModelCapabilities, ProviderMetadata,
    Tool, ToolCall, ToolResult, ToolChoice,
    StreamChunk,
    CancellationToken,
    RequestContext,
};

pub use logging::{Logger, NoOpLogger, ConsoleLogger, TracingLogger};

pub use config::{ToolweaveConfig, FileConfigLoader, ConfigError, ConfigResult};

pub use providers::{Provider, ProviderError, ProviderResult, ProviderRegistry, MockProvider, GenaiProvider};

pub use text::{tokenize, TokenSet};

pub use tools::{
    CapabilityEntry, SourceKind, ToolError, ToolProvider, ToolRegistry,
    LocalToolProvider, SystemToolProvider, RemoteToolProvider,
};

pub use mcp::{McpConnection, McpConnector, McpError, McpResult, CatalogProvider, CachedCatalogProvider};

pub use embeddings::{EmbeddingGenerator, EmbeddingRegistry, EmbeddingCache};

pub use resolver::{CapabilityResolver, CapabilityCandidate, ResolverError};

pub use orchestrator::{Orchestrator, OrchestrationOutput, OrchestrationState, OrchestratorError, OrchestratorResult};
