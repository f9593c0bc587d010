//! Core types shared across the crate
//!
//! This module contains chat, tool-calling, streaming and request types.

mod message;
mod model;
mod tool;
mod stream;
mod cancellation;
mod context;

pub use message::{ChatMessage, ContentPart, MessageRole, MessageContent, last_user_text};
pub use model::{ModelCapabilities, ProviderMetadata, DefaultModel};
pub use tool::{Tool, ToolCall, ToolResult, ToolChoice};
pub use stream::StreamChunk;
pub use cancellation::CancellationToken;
pub use context::{RequestContext, DATA_SOURCE_ID, DOCUMENTS_PRESENT};
