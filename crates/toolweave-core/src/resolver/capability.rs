//! Hybrid semantic and lexical ranking of remote capabilities

use std::sync::Arc;

use futures::future::{join_all, try_join_all};

use crate::config::ResolverSettings;
use crate::embeddings::{
    dot, normalize, CapabilityVector, EmbeddingCache, EmbeddingError, EmbeddingGenerator, EmbeddingResolver,
};
use crate::logging::Logger;
use crate::mcp::{CatalogCapability, CatalogProvider, McpCatalog};
use crate::text::{capability_text, score_capability, tokenize};
use crate::types::CancellationToken;
use crate::{log_debug, log_error, log_warn};

use super::candidate::{merge_candidates, CapabilityCandidate};
use super::error::{ResolverError, ResolverResult};

/// A connection whose catalog was fetched for this resolution
struct Gathered {
    connection_id: String,
    label: String,
    catalog: Arc<McpCatalog>,
}

impl Gathered {
    fn candidate(&self, capability: &CatalogCapability, score: f32) -> CapabilityCandidate {
        CapabilityCandidate {
            source_id: self.connection_id.clone(),
            name: capability.name.clone(),
            source_label: self.label.clone(),
            description: capability.description.clone(),
            kind: capability.kind,
            score,
        }
    }
}

/// Ranks the capabilities of remote connections against a prompt
///
/// Two signals are combined: cosine similarity of embeddings, when a
/// generator resolves for the chat provider, and token overlap, which is
/// always computed. Small catalogs skip scoring entirely.
pub struct CapabilityResolver {
    catalogs: Arc<dyn CatalogProvider>,
    embeddings: Option<Arc<dyn EmbeddingResolver>>,
    cache: Arc<EmbeddingCache>,
    settings: ResolverSettings,
    logger: Arc<dyn Logger>,
}

impl CapabilityResolver {
    pub fn new(catalogs: Arc<dyn CatalogProvider>, settings: ResolverSettings, logger: Arc<dyn Logger>) -> Self {
        Self {
            catalogs,
            embeddings: None,
            cache: Arc::new(EmbeddingCache::default()),
            settings,
            logger,
        }
    }

    /// Enable the semantic path
    ///
    /// Pass the same cache to the catalog provider so invalidating a
    /// connection drops its vectors too.
    pub fn with_embeddings(mut self, resolver: Arc<dyn EmbeddingResolver>, cache: Arc<EmbeddingCache>) -> Self {
        self.embeddings = Some(resolver);
        self.cache = cache;
        self
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn embedding_cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    /// Capabilities of `connection_ids` relevant to `prompt`, best first
    ///
    /// Never fails except on cancellation: unreachable connections are
    /// skipped and any other failure yields an empty list.
    pub async fn resolve(
        &self,
        prompt: &str,
        provider_name: &str,
        connection_name: Option<&str>,
        connection_ids: &[String],
        cancel: &CancellationToken,
    ) -> ResolverResult<Vec<CapabilityCandidate>> {
        if prompt.trim().is_empty() || connection_ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = cancel
            .run_until_cancelled(self.resolve_inner(prompt, provider_name, connection_name, connection_ids, cancel))
            .await
            .unwrap_or(Err(ResolverError::Cancelled));

        match result {
            Ok(candidates) => Ok(candidates),
            Err(e) if e.is_cancelled() => Err(ResolverError::Cancelled),
            Err(e) => {
                log_error!(self.logger, "[CapabilityResolver] Resolution failed, returning no candidates: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn resolve_inner(
        &self,
        prompt: &str,
        provider_name: &str,
        connection_name: Option<&str>,
        connection_ids: &[String],
        cancel: &CancellationToken,
    ) -> ResolverResult<Vec<CapabilityCandidate>> {
        let gathered = self.gather(connection_ids, cancel).await?;

        let total: usize = gathered.iter().map(|g| g.catalog.len()).sum();
        if total <= self.settings.include_all_threshold {
            log_debug!(
                self.logger,
                "[CapabilityResolver] {} capabilities within include-all threshold {}",
                total,
                self.settings.include_all_threshold
            );
            return Ok(include_all(&gathered));
        }

        let generator = self
            .embeddings
            .as_ref()
            .and_then(|r| r.resolve(provider_name, connection_name));

        let semantic = async {
            match &generator {
                Some(generator) => self.semantic_path(generator.as_ref(), prompt, &gathered, cancel).await,
                None => Ok(Vec::new()),
            }
        };
        let lexical = async { self.lexical_scores(prompt, &gathered) };
        let (semantic, lexical) = futures::join!(semantic, lexical);
        let semantic = semantic?;

        log_debug!(
            self.logger,
            "[CapabilityResolver] {} semantic and {} keyword matches over {} capabilities",
            semantic.len(),
            lexical.len(),
            total
        );

        Ok(merge_candidates([semantic, lexical], self.settings.top_k))
    }

    async fn gather(&self, connection_ids: &[String], cancel: &CancellationToken) -> ResolverResult<Vec<Gathered>> {
        let mut ids: Vec<&String> = Vec::new();
        for id in connection_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let fetches = ids
            .into_iter()
            .map(|id| async move { (id, self.catalogs.get_capabilities(id, cancel).await) });

        let mut gathered = Vec::new();
        for (connection_id, result) in join_all(fetches).await {
            match result {
                Ok(catalog) => gathered.push(Gathered {
                    connection_id: connection_id.clone(),
                    label: self.catalogs.label(connection_id),
                    catalog,
                }),
                Err(e) if e.is_cancelled() => return Err(ResolverError::Cancelled),
                Err(e) => {
                    log_warn!(self.logger, "[CapabilityResolver] Skipping connection {}: {}", connection_id, e);
                }
            }
        }
        Ok(gathered)
    }

    fn lexical_scores(&self, prompt: &str, gathered: &[Gathered]) -> Vec<CapabilityCandidate> {
        let query = tokenize(prompt);
        if query.is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for g in gathered {
            for capability in g.catalog.capabilities() {
                let score = score_capability(&query, &capability.name, &capability.description);
                if score > 0.0 && score >= self.settings.keyword_threshold {
                    candidates.push(g.candidate(&capability, score));
                }
            }
        }
        candidates
    }

    /// Semantic scores under the embedding timeout
    ///
    /// A timeout or a failing backend only disables this path; keyword
    /// scores still apply. Cancellation is the one error that escapes.
    async fn semantic_path(
        &self,
        generator: &dyn EmbeddingGenerator,
        prompt: &str,
        gathered: &[Gathered],
        cancel: &CancellationToken,
    ) -> ResolverResult<Vec<CapabilityCandidate>> {
        let scoring = self.semantic_scores(generator, prompt, gathered, cancel);
        match tokio::time::timeout(self.settings.embedding_timeout(), scoring).await {
            Ok(Ok(candidates)) => Ok(candidates),
            Ok(Err(e)) if e.is_cancelled() => Err(ResolverError::Cancelled),
            Ok(Err(e)) => {
                log_warn!(
                    self.logger,
                    "[CapabilityResolver] {} unavailable, using keyword scores only: {}",
                    generator.name(),
                    e
                );
                Ok(Vec::new())
            }
            Err(_) => {
                log_warn!(
                    self.logger,
                    "[CapabilityResolver] {} timed out after {}ms, using keyword scores only",
                    generator.name(),
                    self.settings.embedding_timeout_ms
                );
                Ok(Vec::new())
            }
        }
    }

    async fn semantic_scores(
        &self,
        generator: &dyn EmbeddingGenerator,
        prompt: &str,
        gathered: &[Gathered],
        cancel: &CancellationToken,
    ) -> ResolverResult<Vec<CapabilityCandidate>> {
        let prompt_vector = embed_prompt(generator, prompt, cancel).await?;

        let per_connection =
            try_join_all(gathered.iter().map(|g| self.capability_vectors(generator, g, cancel))).await?;

        let mut candidates = Vec::new();
        for (g, (capabilities, vectors)) in gathered.iter().zip(per_connection) {
            for (capability, v) in capabilities.iter().zip(vectors.iter()) {
                let score = dot(&prompt_vector, &v.vector).clamp(0.0, 1.0);
                if score >= self.settings.similarity_threshold {
                    candidates.push(g.candidate(capability, score));
                }
            }
        }
        Ok(candidates)
    }

    /// Vectors for every capability of a connection, from cache when the
    /// cached texts still match the catalog
    async fn capability_vectors(
        &self,
        generator: &dyn EmbeddingGenerator,
        gathered: &Gathered,
        cancel: &CancellationToken,
    ) -> ResolverResult<(Vec<CatalogCapability>, Arc<Vec<CapabilityVector>>)> {
        let capabilities = gathered.catalog.capabilities();
        let texts: Vec<String> = capabilities
            .iter()
            .map(|c| capability_text(&c.name, &c.description))
            .collect();

        if let Some(cached) = self.cache.get(&gathered.connection_id, generator.name()) {
            let current = cached.len() == texts.len() && cached.iter().zip(&texts).all(|(v, t)| v.text == *t);
            if current {
                return Ok((capabilities, cached));
            }
        }

        if texts.is_empty() {
            return Ok((capabilities, Arc::new(Vec::new())));
        }

        let generation = self.cache.generation(&gathered.connection_id);
        let raw = generator.embed(&texts, cancel).await?;
        if raw.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: raw.len(),
            }
            .into());
        }

        let vectors: Vec<CapabilityVector> = capabilities
            .iter()
            .zip(texts)
            .zip(raw)
            .map(|((c, text), vector)| CapabilityVector {
                kind: c.kind,
                name: c.name.clone(),
                text,
                vector: normalize(vector),
            })
            .collect();

        if !self
            .cache
            .insert(&gathered.connection_id, generator.name(), generation, vectors.clone())
        {
            log_debug!(
                self.logger,
                "[CapabilityResolver] {} invalidated while embedding, vectors not cached",
                gathered.connection_id
            );
        }

        Ok((capabilities, Arc::new(vectors)))
    }
}

async fn embed_prompt(
    generator: &dyn EmbeddingGenerator,
    prompt: &str,
    cancel: &CancellationToken,
) -> ResolverResult<Vec<f32>> {
    let vectors = generator.embed(&[prompt.to_string()], cancel).await?;
    match <[Vec<f32>; 1]>::try_from(vectors) {
        Ok([vector]) => Ok(normalize(vector)),
        Err(vectors) => Err(EmbeddingError::CountMismatch {
            expected: 1,
            actual: vectors.len(),
        }
        .into()),
    }
}

fn include_all(gathered: &[Gathered]) -> Vec<CapabilityCandidate> {
    gathered
        .iter()
        .flat_map(|g| {
            g.catalog
                .capabilities()
                .into_iter()
                .map(move |c| g.candidate(&c, 1.0))
        })
        .collect()
}
