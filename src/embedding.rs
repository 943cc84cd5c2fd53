//! Embedding provider with a one-entry model cache and fallback policy.
//!
//! The [`EmbeddingProvider`] turns chunk and query text into L2-normalized
//! dense vectors. Backends implement the [`TextEncoder`] trait; the
//! default backend runs models locally via fastembed behind the
//! `local-embeddings` feature, exactly one loaded model at a time.
//!
//! # Failure policy
//!
//! - Loading or encoding with the requested model fails → retry once
//!   against the fixed fallback model. On success the fallback becomes
//!   the active cached model and the failed primary is remembered, so
//!   later requests for it route straight to the fallback without
//!   re-attempting the load.
//! - The fallback itself fails → the error surfaces to the caller, which
//!   should operate lexical-only for the rest of the session.
//! - No embedding capability at all (feature off, or provider disabled)
//!   → [`EmbeddingProvider::embed`] still returns a matrix of the correct
//!   shape, filled with zero vectors, so downstream shape invariants
//!   hold. An all-zero matrix means similarity is meaningless; callers
//!   must prefer lexical scoring.
//!
//! All non-degenerate output rows are L2-normalized, so cosine similarity
//! reduces to a plain inner product.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Embedding models in the fixed allow-list.
///
/// Both resolve to 384-dimensional MiniLM variants; the quantized model
/// is the designated fallback (smaller, same dimension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum EmbeddingModelId {
    #[default]
    #[serde(rename = "all-minilm-l6-v2")]
    AllMiniLmL6V2,
    #[serde(rename = "all-minilm-l6-v2-q")]
    AllMiniLmL6V2Q,
}

impl EmbeddingModelId {
    /// The fixed fallback model retried once after a primary failure.
    pub const FALLBACK: EmbeddingModelId = EmbeddingModelId::AllMiniLmL6V2Q;

    pub fn name(&self) -> &'static str {
        match self {
            EmbeddingModelId::AllMiniLmL6V2 => "all-minilm-l6-v2",
            EmbeddingModelId::AllMiniLmL6V2Q => "all-minilm-l6-v2-q",
        }
    }

    /// Embedding vector dimensionality for this model.
    pub fn dims(&self) -> usize {
        match self {
            EmbeddingModelId::AllMiniLmL6V2 | EmbeddingModelId::AllMiniLmL6V2Q => 384,
        }
    }
}

impl FromStr for EmbeddingModelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all-minilm-l6-v2" => Ok(EmbeddingModelId::AllMiniLmL6V2),
            "all-minilm-l6-v2-q" => Ok(EmbeddingModelId::AllMiniLmL6V2Q),
            other => Err(format!(
                "unknown embedding model: '{}'. Supported models: all-minilm-l6-v2, all-minilm-l6-v2-q",
                other
            )),
        }
    }
}

impl fmt::Display for EmbeddingModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl<'de> serde::Deserialize<'de> for EmbeddingModelId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Embedding failure (model initialization or encoding).
#[derive(Debug)]
pub enum EmbedError {
    ModelLoad { model: String, reason: String },
    Encode { model: String, reason: String },
}

impl fmt::Display for EmbedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbedError::ModelLoad { model, reason } => {
                write!(f, "failed to load embedding model '{}': {}", model, reason)
            }
            EmbedError::Encode { model, reason } => {
                write!(f, "encoding with model '{}' failed: {}", model, reason)
            }
        }
    }
}

impl std::error::Error for EmbedError {}

/// A loaded embedding backend for exactly one model.
pub trait TextEncoder: Send {
    /// The model this encoder was loaded for.
    fn model(&self) -> EmbeddingModelId;
    /// Encode a batch of texts, one vector per input, in input order.
    fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Instantiates a [`TextEncoder`] for a given model.
pub type EncoderLoader =
    Box<dyn FnMut(EmbeddingModelId) -> Result<Box<dyn TextEncoder>, EmbedError> + Send>;

/// Embedding provider with a one-entry encoder cache.
///
/// Exactly one model is kept loaded; requesting a different model evicts
/// and replaces it. The cache is never silently stale: eviction happens
/// before the replacement load, and a failed load leaves the cache empty.
pub struct EmbeddingProvider {
    loader: Option<EncoderLoader>,
    cached: Option<Box<dyn TextEncoder>>,
    failed_primary: Option<EmbeddingModelId>,
}

impl EmbeddingProvider {
    /// Build the provider for the compiled embedding capability.
    ///
    /// With the `local-embeddings` feature this loads models locally via
    /// fastembed (downloaded on first use, cached on disk); without it
    /// the provider is permanently unavailable and embeds to zeros.
    #[cfg(feature = "local-embeddings")]
    pub fn from_config(config: &crate::config::EmbeddingConfig) -> Self {
        Self::with_loader(local::loader(config.batch_size))
    }

    #[cfg(not(feature = "local-embeddings"))]
    pub fn from_config(_config: &crate::config::EmbeddingConfig) -> Self {
        Self::disabled()
    }

    /// Provider backed by a custom encoder loader.
    pub fn with_loader(loader: EncoderLoader) -> Self {
        Self {
            loader: Some(loader),
            cached: None,
            failed_primary: None,
        }
    }

    /// Provider with no embedding capability: every embed returns zeros.
    pub fn disabled() -> Self {
        Self {
            loader: None,
            cached: None,
            failed_primary: None,
        }
    }

    /// Whether an embedding backend exists at all.
    pub fn is_available(&self) -> bool {
        self.loader.is_some()
    }

    /// The currently loaded model, if any.
    pub fn active_model(&self) -> Option<EmbeddingModelId> {
        self.cached.as_ref().map(|c| c.model())
    }

    /// Embed a batch of texts with the requested model.
    ///
    /// Always returns `texts.len()` rows of `model.dims()` columns,
    /// regardless of which backend path executed (including the
    /// capability-absent zero path). Rows are L2-normalized.
    pub fn embed(
        &mut self,
        texts: &[String],
        model: EmbeddingModelId,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if self.loader.is_none() {
            return Ok(zero_matrix(texts.len(), model.dims()));
        }

        // A primary that already failed routes straight to the fallback.
        let requested = if self.failed_primary == Some(model) {
            EmbeddingModelId::FALLBACK
        } else {
            model
        };

        match self.encode_with(requested, texts) {
            Ok(rows) => Ok(rows.into_iter().map(normalize_l2).collect()),
            Err(err) if requested != EmbeddingModelId::FALLBACK => {
                eprintln!(
                    "{}; retrying with fallback model '{}'",
                    err,
                    EmbeddingModelId::FALLBACK
                );
                self.cached = None;
                let rows = self.encode_with(EmbeddingModelId::FALLBACK, texts)?;
                self.failed_primary = Some(requested);
                Ok(rows.into_iter().map(normalize_l2).collect())
            }
            Err(err) => Err(err),
        }
    }

    fn encode_with(
        &mut self,
        model: EmbeddingModelId,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        let cache_hit = matches!(&self.cached, Some(c) if c.model() == model);
        if !cache_hit {
            // Evict before replacing so a failed load never leaves a
            // stale encoder behind.
            self.cached = None;
            if let Some(loader) = self.loader.as_mut() {
                self.cached = Some(loader(model)?);
            }
        }
        match self.cached.as_mut() {
            Some(encoder) => encoder.encode(texts),
            None => Err(EmbedError::ModelLoad {
                model: model.name().to_string(),
                reason: "no embedding backend loaded".to_string(),
            }),
        }
    }
}

/// A `rows × dims` matrix of zero vectors.
pub fn zero_matrix(rows: usize, dims: usize) -> Vec<Vec<f32>> {
    vec![vec![0.0; dims]; rows]
}

/// L2-normalize a vector in place; zero vectors pass through unchanged.
pub fn normalize_l2(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-9 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// True when every row of the matrix is a zero vector (the degraded
/// no-backend output, for which similarity is meaningless).
pub fn is_zero_matrix(matrix: &[Vec<f32>]) -> bool {
    matrix.iter().all(|row| row.iter().all(|x| *x == 0.0))
}

#[cfg(feature = "local-embeddings")]
mod local {
    //! fastembed-backed encoder. Models download from Hugging Face on
    //! first use and are cached on disk; after that, encoding runs
    //! entirely offline.

    use super::{EmbedError, EmbeddingModelId, EncoderLoader, TextEncoder};

    struct FastembedEncoder {
        model_id: EmbeddingModelId,
        inner: fastembed::TextEmbedding,
        batch_size: usize,
    }

    impl TextEncoder for FastembedEncoder {
        fn model(&self) -> EmbeddingModelId {
            self.model_id
        }

        fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            self.inner
                .embed(texts.to_vec(), Some(self.batch_size))
                .map_err(|e| EmbedError::Encode {
                    model: self.model_id.name().to_string(),
                    reason: e.to_string(),
                })
        }
    }

    fn to_fastembed_model(model: EmbeddingModelId) -> fastembed::EmbeddingModel {
        match model {
            EmbeddingModelId::AllMiniLmL6V2 => fastembed::EmbeddingModel::AllMiniLML6V2,
            EmbeddingModelId::AllMiniLmL6V2Q => fastembed::EmbeddingModel::AllMiniLML6V2Q,
        }
    }

    pub fn loader(batch_size: usize) -> EncoderLoader {
        Box::new(move |model_id| {
            let inner = fastembed::TextEmbedding::try_new(
                fastembed::InitOptions::new(to_fastembed_model(model_id))
                    .with_show_download_progress(true),
            )
            .map_err(|e| EmbedError::ModelLoad {
                model: model_id.name().to_string(),
                reason: e.to_string(),
            })?;
            Ok(Box::new(FastembedEncoder {
                model_id,
                inner,
                batch_size,
            }) as Box<dyn TextEncoder>)
        })
    }
}
