//! Core data models used throughout ragdex.
//!
//! These types represent the pages, chunks, and ranked results that flow
//! through the indexing and retrieval pipeline.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// One page of extracted document text, as handed over by the extraction
/// collaborator before chunking.
#[derive(Debug, Clone)]
pub struct Page {
    /// Document identifier (typically the file name).
    pub source: String,
    /// 1-based page number, or `None` when the extractor cannot tell.
    pub page: Option<i64>,
    /// Raw extracted text for this page.
    pub text: String,
}

/// A bounded span of page text with provenance.
///
/// Chunks are immutable once created and are only ever replaced wholesale
/// when a session re-ingests.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    /// Session-scoped stable identifier (`ch1`, `ch2`, ...).
    pub id: String,
    /// Chunk text. Never empty after the minimum-length filter.
    pub text: String,
    /// Document identifier this chunk came from.
    pub source: String,
    /// Page number within the source, when known.
    pub page: Option<i64>,
}

/// A ranked retrieval hit: one chunk and its relevance score.
///
/// Lexical scores are overlap counts (plus the phrase bonus); vector
/// scores are inner products of normalized embeddings. Result lists are
/// ordered descending by score and bounded to at most `top_k` entries.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub score: f32,
    pub chunk: Chunk,
}

/// Which retrieval backend a session should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    /// Embedding similarity search (exact or brute-force).
    Vector,
    /// Token/phrase overlap scoring, independent of embeddings.
    Lexical,
}

impl FromStr for SearchBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vector" => Ok(SearchBackend::Vector),
            "lexical" => Ok(SearchBackend::Lexical),
            other => Err(format!(
                "unknown retrieval backend: '{}'. Use vector or lexical.",
                other
            )),
        }
    }
}

impl fmt::Display for SearchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchBackend::Vector => write!(f, "vector"),
            SearchBackend::Lexical => write!(f, "lexical"),
        }
    }
}

impl<'de> serde::Deserialize<'de> for SearchBackend {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!(
            "vector".parse::<SearchBackend>().unwrap(),
            SearchBackend::Vector
        );
        assert_eq!(
            "lexical".parse::<SearchBackend>().unwrap(),
            SearchBackend::Lexical
        );
        assert!("hybrid".parse::<SearchBackend>().is_err());
    }

    #[test]
    fn test_backend_display_roundtrip() {
        for b in [SearchBackend::Vector, SearchBackend::Lexical] {
            assert_eq!(b.to_string().parse::<SearchBackend>().unwrap(), b);
        }
    }
}
