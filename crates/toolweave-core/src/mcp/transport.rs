//! Transport seam between capability scoring and remote servers

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::logging::Logger;
use crate::types::CancellationToken;

use super::catalog::{McpCallResult, McpCatalog, McpPromptInfo, McpResourceInfo, McpResourceTemplateInfo, McpToolInfo};
use super::client::HttpTransport;
use super::connection::{McpConnectionStore, STREAMABLE_HTTP};
#[cfg(unix)]
use super::client::UnixSocketTransport;
#[cfg(unix)]
use super::connection::UNIX_SOCKET;
use super::connection::McpConnection;
use super::error::{McpError, McpResult};
use crate::log_debug;

/// An open session with a remote capability server
#[async_trait]
pub trait McpSession: Send + Sync {
    async fn list_tools(&self) -> McpResult<Vec<McpToolInfo>>;

    async fn list_prompts(&self) -> McpResult<Vec<McpPromptInfo>>;

    async fn list_resources(&self) -> McpResult<Vec<McpResourceInfo>>;

    async fn list_resource_templates(&self) -> McpResult<Vec<McpResourceTemplateInfo>>;

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<McpCallResult>;

    async fn close(&self) -> McpResult<()>;
}

/// Opens sessions for connections of one transport kind
#[async_trait]
pub trait McpTransport: Send + Sync {
    async fn open(&self, connection: &McpConnection) -> McpResult<Arc<dyn McpSession>>;
}

/// Transport implementations keyed by transport name
pub struct TransportRegistry {
    transports: RwLock<HashMap<String, Arc<dyn McpTransport>>>,
}

impl TransportRegistry {
    /// Empty registry
    pub fn empty() -> Self {
        Self {
            transports: RwLock::new(HashMap::new()),
        }
    }

    /// Registry with the built-in rmcp transports
    pub fn with_defaults(logger: Arc<dyn Logger>) -> Self {
        let registry = Self::empty();
        registry.register(STREAMABLE_HTTP, Arc::new(HttpTransport::new(Arc::clone(&logger))));
        #[cfg(unix)]
        registry.register(UNIX_SOCKET, Arc::new(UnixSocketTransport::new(Arc::clone(&logger))));
        registry
    }

    /// Register or replace a transport
    pub fn register(&self, key: &str, transport: Arc<dyn McpTransport>) {
        self.transports.write().insert(key.to_string(), transport);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn McpTransport>> {
        self.transports.read().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.transports.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

fn optional_listing<T>(
    result: McpResult<Vec<T>>,
    connection_id: &str,
    kind: &str,
    logger: &dyn Logger,
) -> Vec<T> {
    result.unwrap_or_else(|e| {
        log_debug!(
            logger,
            "[McpConnector] {} did not list {}: {}",
            connection_id, kind, e
        );
        Vec::new()
    })
}

/// Opens sessions by connection id
///
/// Holds identifiers and lookups only; every call to `open` creates a fresh
/// session that the caller closes.
pub struct McpConnector {
    connections: Arc<dyn McpConnectionStore>,
    transports: Arc<TransportRegistry>,
}

impl McpConnector {
    pub fn new(connections: Arc<dyn McpConnectionStore>, transports: Arc<TransportRegistry>) -> Self {
        Self {
            connections,
            transports,
        }
    }

    pub fn connection(&self, connection_id: &str) -> McpResult<McpConnection> {
        self.connections
            .get(connection_id)
            .ok_or_else(|| McpError::UnknownConnection(connection_id.to_string()))
    }

    /// Open a session, giving up as soon as `cancel` fires
    pub async fn open(
        &self,
        connection_id: &str,
        cancel: &CancellationToken,
    ) -> McpResult<Arc<dyn McpSession>> {
        let connection = self.connection(connection_id)?;
        let transport = self
            .transports
            .get(&connection.transport)
            .ok_or_else(|| McpError::UnknownTransport(connection.transport.clone()))?;

        cancel
            .run_until_cancelled(transport.open(&connection))
            .await
            .unwrap_or(Err(McpError::Cancelled))
    }

    /// Fetch the full catalog of a connection in one session
    ///
    /// Tools are required. Prompts, resources and templates are optional
    /// server features, so a failure listing them yields an empty list.
    pub async fn fetch_catalog(
        &self,
        connection_id: &str,
        cancel: &CancellationToken,
        logger: &dyn Logger,
    ) -> McpResult<McpCatalog> {
        let session = self.open(connection_id, cancel).await?;

        let listing = async {
            let tools = session.list_tools().await?;
            let (prompts, resources, templates) = futures::join!(
                session.list_prompts(),
                session.list_resources(),
                session.list_resource_templates()
            );
            Ok::<_, McpError>(McpCatalog {
                tools,
                prompts: optional_listing(prompts, connection_id, "prompts", logger),
                resources: optional_listing(resources, connection_id, "resources", logger),
                resource_templates: optional_listing(templates, connection_id, "resource templates", logger),
            })
        };

        let result = cancel
            .run_until_cancelled(listing)
            .await
            .unwrap_or(Err(McpError::Cancelled));

        if let Err(e) = session.close().await {
            log_debug!(logger, "[McpConnector] Closing {} failed: {}", connection_id, e);
        }

        result
    }
}
