//! Lexical tokenizer used for relevance scoring
//!
//! Pipeline: acronym pre-split, whitespace split, compound-word split,
//! lower-case, stop-word removal, stemming. The result is a set, so repeated
//! words count once.

use std::collections::HashSet;

use super::stemmer::stem;
use super::stop_words::is_stop_word;

/// Normalized tokens of a piece of text
pub type TokenSet = HashSet<String>;

/// Tokenize free text into a set of normalized tokens
///
/// Accepts `&str` or `Option<&str>`; `None`, empty and whitespace-only input
/// produce an empty set.
///
/// ```
/// use toolweave_core::text::tokenize;
///
/// let tokens = tokenize("createJiraTicket");
/// assert!(tokens.contains("jira"));
/// assert!(tokens.contains("ticket"));
/// ```
pub fn tokenize<'a>(text: impl Into<Option<&'a str>>) -> TokenSet {
    let Some(text) = text.into() else {
        return TokenSet::new();
    };
    if text.trim().is_empty() {
        return TokenSet::new();
    }

    let presplit = split_acronym_boundaries(text);
    let mut tokens = TokenSet::new();

    for raw in presplit.split_whitespace() {
        for word in split_compound(raw) {
            let lower = word.to_lowercase();
            if is_stop_word(&lower) {
                continue;
            }
            tokens.insert(stem(&lower));
        }
    }

    tokens
}

/// Insert a space where an uppercase run meets a capitalized word
///
/// `JSONSchema` becomes `JSON Schema`. A plain lower-to-upper splitter would
/// keep `JSONSchema` as one token.
fn split_acronym_boundaries(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        let next_upper = chars.get(i + 1).is_some_and(|n| n.is_uppercase());
        let then_lower = chars.get(i + 2).is_some_and(|n| n.is_lowercase());
        if c.is_uppercase() && next_upper && then_lower {
            out.push(' ');
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Upper,
    Lower,
    Digit,
    Separator,
}

impl CharClass {
    fn of(c: char) -> Self {
        if c.is_uppercase() {
            CharClass::Upper
        } else if c.is_alphabetic() {
            CharClass::Lower
        } else if c.is_numeric() {
            CharClass::Digit
        } else {
            CharClass::Separator
        }
    }
}

/// Split on case changes, letter/digit boundaries and punctuation
fn split_compound(token: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut prev: Option<CharClass> = None;

    for c in token.chars() {
        let class = CharClass::of(c);
        if class == CharClass::Separator {
            flush(&mut current, &mut parts);
            prev = None;
            continue;
        }

        if let Some(p) = prev {
            let boundary = matches!(
                (p, class),
                (CharClass::Lower, CharClass::Upper)
                    | (CharClass::Digit, CharClass::Upper | CharClass::Lower)
                    | (CharClass::Upper | CharClass::Lower, CharClass::Digit)
            );
            if boundary {
                flush(&mut current, &mut parts);
            }
        }

        current.push(c);
        prev = Some(class);
    }

    flush(&mut current, &mut parts);
    parts
}

fn flush(current: &mut String, parts: &mut Vec<String>) {
    if !current.is_empty() {
        parts.push(std::mem::take(current));
    }
}
