//! Remote capability servers (Model Context Protocol)
//!
//! Connections are configured up front and looked up by id. Sessions are
//! opened per catalog fetch or per tool call and closed right after, so no
//! handle outlives the operation that needed it.

mod error;
mod connection;
mod catalog;
mod auth;
mod client;
pub(crate) mod transport;
mod cache;
mod proxy;

pub use error::{McpError, McpResult};
pub use connection::{McpAuth, McpConnection, McpConnectionStore, MemoryConnectionStore, STREAMABLE_HTTP, UNIX_SOCKET};
pub use catalog::{
    CapabilityType, CatalogCapability, McpCallResult, McpCatalog, McpPromptInfo, McpResourceInfo,
    McpResourceTemplateInfo, McpToolInfo,
};
pub use auth::connection_headers;
pub use client::{HttpTransport, McpClient};
#[cfg(unix)]
pub use client::UnixSocketTransport;
pub use transport::{McpConnector, McpSession, McpTransport, TransportRegistry};
pub use cache::{CachedCatalogProvider, CatalogProvider};
pub use proxy::McpToolProxy;
