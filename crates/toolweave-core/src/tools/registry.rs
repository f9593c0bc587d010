//! Aggregation and lexical search over every capability provider

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;

use crate::logging::Logger;
use crate::text::{score_capability, tokenize, TokenSet};
use crate::types::{CancellationToken, RequestContext};

use super::entry::CapabilityEntry;
use super::error::ToolError;
use super::provider::ToolProvider;
use crate::{log_debug, log_warn};

/// Central view of all capabilities available to a request
///
/// Providers are queried concurrently and failures are isolated: a provider
/// that errors is logged and left out. Only cancellation aborts a call.
pub struct ToolRegistry {
    providers: Vec<Arc<dyn ToolProvider>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            providers: Vec::new(),
            logger,
        }
    }

    /// Add a provider; enumeration order follows registration order
    pub fn with_provider(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Every entry from every healthy provider
    ///
    /// Entries with the same `(source_id, name)` are the same capability;
    /// the first one seen wins.
    pub async fn get_all(
        &self,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<CapabilityEntry>, ToolError> {
        let calls = self.providers.iter().map(|p| async move {
            (p.name().to_string(), p.get_tools(context, cancel).await)
        });

        let results = cancel
            .run_until_cancelled(join_all(calls))
            .await
            .ok_or(ToolError::Cancelled)?;

        let mut seen: HashSet<(Option<String>, String)> = HashSet::new();
        let mut entries = Vec::new();
        for (provider, result) in results {
            match result {
                Ok(provided) => {
                    for entry in provided {
                        if seen.insert((entry.source_id.clone(), entry.name.clone())) {
                            entries.push(entry);
                        }
                    }
                }
                Err(e) if e.is_cancelled() => return Err(ToolError::Cancelled),
                Err(e) => {
                    log_warn!(
                        self.logger,
                        "[ToolRegistry] Provider {} failed, excluding its tools: {}",
                        provider, e
                    );
                }
            }
        }

        log_debug!(
            self.logger,
            "[ToolRegistry] {} capabilities from {} providers",
            entries.len(),
            self.providers.len()
        );
        Ok(entries)
    }

    /// Entries ranked by lexical relevance to `query`, at most `top_k`
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        context: &RequestContext,
        cancel: &CancellationToken,
    ) -> Result<Vec<CapabilityEntry>, ToolError> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let entries = self.get_all(context, cancel).await?;
        Ok(rank_entries(&query_tokens, entries, top_k))
    }
}

/// Sort by overlap score, highest first, keeping enumeration order for ties
pub fn rank_entries(query: &TokenSet, entries: Vec<CapabilityEntry>, top_k: usize) -> Vec<CapabilityEntry> {
    let mut scored: Vec<(f32, CapabilityEntry)> = entries
        .into_iter()
        .map(|e| (score_capability(query, &e.name, &e.description), e))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(top_k).map(|(_, e)| e).collect()
}
