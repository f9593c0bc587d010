//! Relevance ranking of remote capabilities for a prompt

mod error;
mod candidate;
mod capability;

pub use error::{ResolverError, ResolverResult};
pub use candidate::{merge_candidates, CapabilityCandidate};
pub use capability::CapabilityResolver;
