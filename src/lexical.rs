//! Lexical overlap scorer.
//!
//! Scores chunks against a query using token-set overlap plus a verbatim
//! phrase bonus, entirely independent of embeddings. This is the backend
//! of last resort: it is always available, so retrieval can degrade to it
//! whenever the vector path is missing or broken.
//!
//! Scoring per chunk:
//!
//! ```text
//! token_overlap = |set(query_tokens) ∩ set(chunk_tokens)|
//! phrase_bonus  = bonus if the space-joined query tokens appear verbatim
//!                 in the lowercased chunk text, else 0
//! score         = token_overlap + phrase_bonus
//! ```
//!
//! Chunks scoring strictly below `min_score` are excluded outright — a
//! hard cutoff, not a weighting — so vacuous one-word matches never count
//! as relevant.

use std::collections::HashSet;

use crate::config::RetrievalConfig;
use crate::models::{Chunk, RetrievalResult};

/// Common English function words excluded from token matching.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "while", "is", "are", "was", "were", "be", "been",
    "being", "to", "of", "in", "on", "for", "with", "as", "by", "from", "at", "this", "that",
    "these", "those", "into", "over", "under", "within", "without", "about", "up", "down", "out",
    "off", "then", "than", "so", "such", "it", "its", "their", "your", "our", "my", "we", "you",
    "he", "she", "they", "them", "i", "me", "his", "her", "theirs", "ours", "yours",
];

/// Lowercase, map every non-alphanumeric character to a separator, split
/// on whitespace, and drop stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    // Lowercasing can expand one char into several ('İ' lowers to two
    // codepoints), so extend rather than map one-to-one.
    let mut normalized = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            normalized.extend(c.to_lowercase());
        } else {
            normalized.push(' ');
        }
    }

    normalized
        .split_whitespace()
        .filter(|t| !STOPWORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Score every chunk against the query and return the top `top_k` hits.
///
/// Results are sorted descending by score; ties preserve original chunk
/// order (stable sort). Scores strictly below `config.min_lexical_score`
/// are excluded entirely.
pub fn score_chunks(
    query: &str,
    chunks: &[Chunk],
    config: &RetrievalConfig,
    top_k: usize,
) -> Vec<RetrievalResult> {
    if chunks.is_empty() {
        return Vec::new();
    }

    let query_tokens = tokenize(query);
    let query_set: HashSet<&str> = query_tokens.iter().map(|t| t.as_str()).collect();
    let query_phrase = query_tokens.join(" ");

    let mut scored: Vec<RetrievalResult> = chunks
        .iter()
        .filter_map(|chunk| {
            let chunk_tokens = tokenize(&chunk.text);
            let chunk_set: HashSet<&str> = chunk_tokens.iter().map(|t| t.as_str()).collect();
            let token_overlap = query_set.intersection(&chunk_set).count() as u32;

            let phrase_bonus = if !query_phrase.is_empty()
                && chunk.text.to_lowercase().contains(&query_phrase)
            {
                config.phrase_bonus
            } else {
                0
            };

            let score = token_overlap + phrase_bonus;
            if score >= config.min_lexical_score {
                Some(RetrievalResult {
                    score: score as f32,
                    chunk: chunk.clone(),
                })
            } else {
                None
            }
        })
        .collect();

    // Stable: equal scores keep original chunk order.
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(top_k);
    scored
}
