use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::embedding::EmbeddingModelId;
use crate::models::SearchBackend;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Window length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters shared between consecutive windows.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    /// Chunks whose trimmed length is at or below this are dropped
    /// (headers, page numbers, near-empty artifacts).
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            min_chunk_chars: default_min_chunk_chars(),
        }
    }
}

fn default_chunk_size() -> usize {
    800
}
fn default_overlap() -> usize {
    120
}
fn default_min_chunk_chars() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_backend")]
    pub backend: SearchBackend,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Hard cutoff: lexical scores strictly below this are excluded.
    #[serde(default = "default_min_lexical_score")]
    pub min_lexical_score: u32,
    /// Added when the space-joined query tokens appear verbatim in a chunk.
    #[serde(default = "default_phrase_bonus")]
    pub phrase_bonus: u32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            top_k: default_top_k(),
            min_lexical_score: default_min_lexical_score(),
            phrase_bonus: default_phrase_bonus(),
        }
    }
}

fn default_backend() -> SearchBackend {
    SearchBackend::Vector
}
fn default_top_k() -> usize {
    5
}
fn default_min_lexical_score() -> u32 {
    3
}
fn default_phrase_bonus() -> u32 {
    6
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// Embedding model, from the fixed allow-list.
    #[serde(default)]
    pub model: EmbeddingModelId,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: EmbeddingModelId::default(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    64
}

/// Load and validate a TOML config file.
///
/// A missing file is not an error: the built-in defaults apply, so the CLI
/// works out of the box.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.overlap >= config.chunking.chunk_size {
        anyhow::bail!(
            "chunking.overlap ({}) must be < chunking.chunk_size ({})",
            config.chunking.overlap,
            config.chunking.chunk_size
        );
    }
    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }
    Ok(())
}
