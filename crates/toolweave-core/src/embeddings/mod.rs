//! Semantic scoring support
//!
//! Generators are optional collaborators: when none resolves for a request,
//! capability resolution runs on lexical overlap alone.

mod error;
mod traits;
mod registry;
mod openai;
mod cache;
mod vector;

pub use error::{EmbeddingError, EmbeddingResult};
pub use traits::{EmbeddingGenerator, EmbeddingResolver};
pub use registry::{EmbeddingFactory, EmbeddingRegistry};
pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingGenerator};
pub use cache::{CapabilityVector, EmbeddingCache};
pub use vector::{dot, normalize};
