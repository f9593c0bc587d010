//! Per-connection cache of capability embeddings

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::mcp::CapabilityType;

/// Embedding of one capability's `"name: description"` text
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityVector {
    pub kind: CapabilityType,
    pub name: String,
    /// The text that was embedded
    pub text: String,
    /// Unit-length vector
    pub vector: Vec<f32>,
}

struct Entry {
    generator: String,
    vectors: Arc<Vec<CapabilityVector>>,
    stored_at: Instant,
}

/// Embedding cache keyed by connection id
///
/// Entries are tagged with the generator that produced them; a lookup with a
/// different generator is a miss. Each key carries a generation number that
/// `invalidate` bumps, so a fetch that started before an invalidation cannot
/// store its now-stale result.
pub struct EmbeddingCache {
    entries: DashMap<String, Entry>,
    generations: DashMap<String, u64>,
    ttl: Duration,
}

impl EmbeddingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            generations: DashMap::new(),
            ttl,
        }
    }

    /// Current generation of a key; pass it back to `insert`
    pub fn generation(&self, connection_id: &str) -> u64 {
        self.generations.get(connection_id).map(|g| *g).unwrap_or(0)
    }

    /// Fresh vectors for a connection produced by `generator`
    pub fn get(&self, connection_id: &str, generator: &str) -> Option<Arc<Vec<CapabilityVector>>> {
        let entry = self.entries.get(connection_id)?;
        if entry.generator != generator || entry.stored_at.elapsed() > self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.vectors))
    }

    /// Store vectors unless the key was invalidated since `generation` was read
    pub fn insert(
        &self,
        connection_id: &str,
        generator: &str,
        generation: u64,
        vectors: Vec<CapabilityVector>,
    ) -> bool {
        // Hold the generation shard while inserting so invalidate cannot interleave
        let current = self.generations.entry(connection_id.to_string()).or_insert(0);
        if *current != generation {
            return false;
        }
        self.entries.insert(
            connection_id.to_string(),
            Entry {
                generator: generator.to_string(),
                vectors: Arc::new(vectors),
                stored_at: Instant::now(),
            },
        );
        true
    }

    pub fn invalidate(&self, connection_id: &str) {
        let mut generation = self.generations.entry(connection_id.to_string()).or_insert(0);
        *generation += 1;
        self.entries.remove(connection_id);
    }

    pub fn clear(&self) {
        for mut generation in self.generations.iter_mut() {
            *generation += 1;
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}
