//! Lexical overlap scoring

use super::tokenizer::{tokenize, TokenSet};

/// Text used to score a capability: `"<name>: <description>"`
pub fn capability_text(name: &str, description: &str) -> String {
    format!("{}: {}", name, description)
}

/// Overlap between two token sets, in [0, 1]
///
/// The larger of `matches / |query|` and `matches / |candidate|`. Short names
/// score well against long queries and the other way round; a single-token
/// candidate reaches 1.0 on one shared token.
pub fn overlap_score(query: &TokenSet, candidate: &TokenSet) -> f32 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let (small, large) = if query.len() <= candidate.len() {
        (query, candidate)
    } else {
        (candidate, query)
    };
    let matches = small.iter().filter(|t| large.contains(*t)).count();
    if matches == 0 {
        return 0.0;
    }

    let forward = matches as f32 / query.len() as f32;
    let reverse = matches as f32 / candidate.len() as f32;
    forward.max(reverse)
}

/// Score a capability's name and description against pre-tokenized query text
pub fn score_capability(query: &TokenSet, name: &str, description: &str) -> f32 {
    overlap_score(query, &tokenize(capability_text(name, description).as_str()))
}
