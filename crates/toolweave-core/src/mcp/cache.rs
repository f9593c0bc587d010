//! TTL cache of remote catalogs

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::embeddings::EmbeddingCache;
use crate::logging::Logger;
use crate::types::CancellationToken;

use super::catalog::McpCatalog;
use super::error::McpResult;
use super::transport::McpConnector;
use crate::log_debug;

/// Source of remote catalogs
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Catalog of one connection, served from cache while fresh
    async fn get_capabilities(
        &self,
        connection_id: &str,
        cancel: &CancellationToken,
    ) -> McpResult<Arc<McpCatalog>>;

    /// Drop everything cached for a connection
    fn invalidate(&self, connection_id: &str);

    /// Human-readable label for a connection
    fn label(&self, connection_id: &str) -> String {
        connection_id.to_string()
    }
}

struct CachedCatalog {
    catalog: Arc<McpCatalog>,
    fetched_at: Instant,
}

/// Catalog provider that fetches through an [`McpConnector`] and caches per connection
///
/// Invalidating a connection also clears its embeddings so the two caches
/// never disagree about what a connection exposes.
pub struct CachedCatalogProvider {
    connector: Arc<McpConnector>,
    entries: DashMap<String, CachedCatalog>,
    generations: DashMap<String, u64>,
    ttl: Duration,
    embeddings: Option<Arc<EmbeddingCache>>,
    logger: Arc<dyn Logger>,
}

impl CachedCatalogProvider {
    pub fn new(connector: Arc<McpConnector>, ttl: Duration, logger: Arc<dyn Logger>) -> Self {
        Self {
            connector,
            entries: DashMap::new(),
            generations: DashMap::new(),
            ttl,
            embeddings: None,
            logger,
        }
    }

    /// Clear this embedding cache together with the catalog cache
    pub fn with_embedding_cache(mut self, embeddings: Arc<EmbeddingCache>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    pub fn connector(&self) -> &Arc<McpConnector> {
        &self.connector
    }

    fn fresh(&self, connection_id: &str) -> Option<Arc<McpCatalog>> {
        let entry = self.entries.get(connection_id)?;
        if entry.fetched_at.elapsed() > self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.catalog))
    }

    fn generation(&self, connection_id: &str) -> u64 {
        self.generations.get(connection_id).map(|g| *g).unwrap_or(0)
    }

    fn store(&self, connection_id: &str, generation: u64, catalog: Arc<McpCatalog>) {
        let current = self.generations.entry(connection_id.to_string()).or_insert(0);
        if *current != generation {
            log_debug!(
                self.logger,
                "[CatalogCache] {} invalidated during fetch, result not cached",
                connection_id
            );
            return;
        }
        self.entries.insert(
            connection_id.to_string(),
            CachedCatalog {
                catalog,
                fetched_at: Instant::now(),
            },
        );
    }
}

#[async_trait]
impl CatalogProvider for CachedCatalogProvider {
    async fn get_capabilities(
        &self,
        connection_id: &str,
        cancel: &CancellationToken,
    ) -> McpResult<Arc<McpCatalog>> {
        if let Some(catalog) = self.fresh(connection_id) {
            return Ok(catalog);
        }

        let generation = self.generation(connection_id);
        let catalog = Arc::new(
            self.connector
                .fetch_catalog(connection_id, cancel, self.logger.as_ref())
                .await?,
        );

        log_debug!(
            self.logger,
            "[CatalogCache] Fetched {} capabilities from {}",
            catalog.len(),
            connection_id
        );
        self.store(connection_id, generation, Arc::clone(&catalog));
        Ok(catalog)
    }

    fn invalidate(&self, connection_id: &str) {
        {
            let mut generation = self.generations.entry(connection_id.to_string()).or_insert(0);
            *generation += 1;
            self.entries.remove(connection_id);
        }
        if let Some(embeddings) = &self.embeddings {
            embeddings.invalidate(connection_id);
        }
        log_debug!(self.logger, "[CatalogCache] Invalidated {}", connection_id);
    }

    fn label(&self, connection_id: &str) -> String {
        self.connector
            .connection(connection_id)
            .map(|c| c.label().to_string())
            .unwrap_or_else(|_| connection_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CapabilityVector;
    use crate::logging::NoOpLogger;
    use crate::mcp::transport::testing::{connector, StaticTransport};
    use crate::mcp::{CapabilityType, McpToolInfo};

    fn provider(transport: Arc<StaticTransport>, ttl: Duration) -> CachedCatalogProvider {
        CachedCatalogProvider::new(connector(transport, &["jira", "down"]), ttl, Arc::new(NoOpLogger))
    }

    fn jira() -> McpCatalog {
        McpCatalog::with_tools(vec![McpToolInfo::new("createIssue", "Create an issue")])
    }

    #[tokio::test]
    async fn test_second_call_is_cached() {
        let transport = Arc::new(StaticTransport::new().with_catalog("jira", jira()));
        let cache = provider(Arc::clone(&transport), Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let first = cache.get_capabilities("jira", &cancel).await.unwrap();
        let second = cache.get_capabilities("jira", &cancel).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(transport.open_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let transport = Arc::new(StaticTransport::new().with_catalog("jira", jira()));
        let cache = provider(Arc::clone(&transport), Duration::ZERO);
        let cancel = CancellationToken::new();

        cache.get_capabilities("jira", &cancel).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.get_capabilities("jira", &cancel).await.unwrap();
        assert_eq!(transport.open_count(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_clears_embeddings_too() {
        let transport = Arc::new(StaticTransport::new().with_catalog("jira", jira()));
        let embeddings = Arc::new(EmbeddingCache::default());
        let cache = provider(Arc::clone(&transport), Duration::from_secs(60))
            .with_embedding_cache(Arc::clone(&embeddings));
        let cancel = CancellationToken::new();

        cache.get_capabilities("jira", &cancel).await.unwrap();
        embeddings.insert(
            "jira",
            "small",
            embeddings.generation("jira"),
            vec![CapabilityVector {
                kind: CapabilityType::Tool,
                name: "createIssue".to_string(),
                text: "createIssue: Create an issue".to_string(),
                vector: vec![1.0],
            }],
        );

        cache.invalidate("jira");
        assert!(embeddings.get("jira", "small").is_none());

        cache.get_capabilities("jira", &cancel).await.unwrap();
        assert_eq!(transport.open_count(), 2);
    }

    #[tokio::test]
    async fn test_failures_and_cancellation_are_not_cached() {
        let transport = Arc::new(StaticTransport::new().failing("down"));
        let cache = provider(Arc::clone(&transport), Duration::from_secs(60));

        assert!(cache.get_capabilities("down", &CancellationToken::new()).await.is_err());
        assert!(cache.get_capabilities("down", &CancellationToken::new()).await.is_err());
        assert_eq!(transport.open_count(), 2);

        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let err = cache.get_capabilities("jira", &cancelled).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(cache.entries.is_empty());
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let cache = provider(Arc::new(StaticTransport::new()), Duration::from_secs(60));
        assert_eq!(cache.label("jira"), "jira");
        assert_eq!(cache.label("unknown"), "unknown");
    }
}
