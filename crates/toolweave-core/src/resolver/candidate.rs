//! Scored remote capabilities and their merge

use std::collections::HashMap;

use crate::mcp::CapabilityType;

/// A remote capability judged relevant to a prompt
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityCandidate {
    /// Connection id the capability belongs to
    pub source_id: String,
    pub name: String,
    /// Human-readable label of the connection
    pub source_label: String,
    pub description: String,
    pub kind: CapabilityType,
    /// Relevance in [0, 1]
    pub score: f32,
}

impl CapabilityCandidate {
    /// Identity used when merging results from several scoring paths
    pub fn key(&self) -> (&str, &str) {
        (&self.source_id, &self.name)
    }
}

/// Merge scoring paths into one ranked list
///
/// Candidates sharing `(source_id, name)` collapse to the one with the highest
/// score. The result is sorted by score, highest first; ties keep the order
/// in which the candidates were first seen. At most `top_k` are returned.
pub fn merge_candidates<I>(paths: I, top_k: usize) -> Vec<CapabilityCandidate>
where
    I: IntoIterator<Item = Vec<CapabilityCandidate>>,
{
    let mut merged: Vec<CapabilityCandidate> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for candidate in paths.into_iter().flatten() {
        let key = (candidate.source_id.clone(), candidate.name.clone());
        match index.get(&key) {
            Some(&i) => {
                if candidate.score > merged[i].score {
                    merged[i] = candidate;
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(candidate);
            }
        }
    }

    merged.sort_by(|a, b| b.score.total_cmp(&a.score));
    merged.truncate(top_k);
    merged
}
