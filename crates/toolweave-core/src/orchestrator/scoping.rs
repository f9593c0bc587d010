//! Narrowing the entry set to what a turn needs

use crate::config::OrchestratorSettings;
use crate::text::{score_capability, tokenize};
use crate::tools::CapabilityEntry;

/// Entries to offer the model, given an optional plan
///
/// Local entries are always kept. Others must score strictly above the
/// relevance cutoff against the plan and are ranked best first. A blank plan,
/// or one that selects nothing, fills the remaining capacity with non-local
/// entries in their original order so the model is never left without them.
pub fn scope_entries(
    entries: Vec<CapabilityEntry>,
    plan: Option<&str>,
    settings: &OrchestratorSettings,
) -> Vec<CapabilityEntry> {
    let (local, others): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.is_local());
    let capacity = settings.max_scoped_tools.saturating_sub(local.len());

    let plan_tokens = tokenize(plan);
    let mut selected: Vec<CapabilityEntry> = Vec::new();
    if !plan_tokens.is_empty() {
        let mut scored: Vec<(f32, &CapabilityEntry)> = others
            .iter()
            .map(|e| (score_capability(&plan_tokens, &e.name, &e.description), e))
            .filter(|(score, _)| *score > settings.relevance_cutoff)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        selected = scored.into_iter().take(capacity).map(|(_, e)| e.clone()).collect();
    }

    if selected.is_empty() {
        selected = others.into_iter().take(capacity).collect();
    }

    local.into_iter().chain(selected).collect()
}
