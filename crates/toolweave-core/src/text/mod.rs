//! Text normalization and lexical relevance scoring
//!
//! Everything here is pure and safe to call from any number of tasks.

mod stemmer;
mod stop_words;
mod tokenizer;
mod scoring;

pub use stemmer::stem;
pub use stop_words::is_stop_word;
pub use tokenizer::{tokenize, TokenSet};
pub use scoring::{capability_text, overlap_score, score_capability};
