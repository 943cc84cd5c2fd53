//! Retrieval dispatch: route a query to the vector index or the lexical
//! scorer, degrading gracefully when vector search cannot serve.
//!
//! Backend priority is strict. An explicit lexical backend always wins.
//! Vector retrieval runs only when the session has a committed embedding
//! matrix and index, an embedding backend is available, and the matrix
//! is not the degraded all-zero output. Everything else falls back to
//! lexical scoring, which needs nothing beyond the chunks themselves.
//! Fallbacks are reported on stderr; they are never silent and never an
//! error. Genuine inconsistencies (a query vector whose dimension does
//! not match the index) do fail the call.

use anyhow::{Context, Result};
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::Config;
use crate::embedding::{self, EmbeddingModelId, EmbeddingProvider};
use crate::ingest;
use crate::lexical;
use crate::models::{RetrievalResult, SearchBackend};
use crate::session::Session;

const EXCERPT_CHARS: usize = 240;

/// The outcome of one retrieval call.
pub struct RetrievalOutcome {
    pub results: Vec<RetrievalResult>,
    /// The backend that actually served the query, after any fallback.
    pub backend_used: SearchBackend,
    /// The index variant that served a vector query; `None` for lexical.
    pub index_kind: Option<&'static str>,
}

/// Retrieve the top `top_k` chunks for a query.
///
/// Never fails because embeddings are unavailable; those paths degrade
/// to lexical scoring with a stderr notice. An empty or whitespace-only
/// query yields no results from either backend.
pub fn retrieve(
    session: &Session,
    provider: &mut EmbeddingProvider,
    config: &Config,
    query: &str,
    backend: SearchBackend,
    top_k: usize,
) -> Result<RetrievalOutcome> {
    if query.trim().is_empty() {
        return Ok(RetrievalOutcome {
            results: Vec::new(),
            backend_used: SearchBackend::Lexical,
            index_kind: None,
        });
    }

    if backend == SearchBackend::Lexical {
        return Ok(lexical_outcome(session, config, query, top_k));
    }

    let vector_ready = match (session.embeddings(), session.index()) {
        (Some(matrix), Some(_)) => {
            provider.is_available() && !embedding::is_zero_matrix(matrix)
        }
        _ => false,
    };
    if !vector_ready {
        eprintln!("vector search unavailable for this session; using lexical scoring");
        return Ok(lexical_outcome(session, config, query, top_k));
    }

    // Query vectors must come from the same model as the corpus matrix.
    let model = match session.embedded_with() {
        Some(model) => model,
        None => {
            eprintln!("vector search unavailable for this session; using lexical scoring");
            return Ok(lexical_outcome(session, config, query, top_k));
        }
    };

    let query_matrix = match provider.embed(&[query.to_string()], model) {
        Ok(matrix) => matrix,
        Err(err) => {
            eprintln!("{}; using lexical scoring", err);
            return Ok(lexical_outcome(session, config, query, top_k));
        }
    };
    let query_vec = query_matrix
        .into_iter()
        .next()
        .context("embedding provider returned no row for the query")?;

    let index = session
        .index()
        .context("session lost its index during retrieval")?;
    let hits = index.search(&query_vec, top_k)?;

    let chunks = session.chunks();
    let results = hits
        .into_iter()
        .filter(|(row, _)| *row < chunks.len())
        .map(|(row, score)| RetrievalResult {
            score,
            chunk: chunks[row].clone(),
        })
        .collect();

    Ok(RetrievalOutcome {
        results,
        backend_used: SearchBackend::Vector,
        index_kind: Some(index.kind()),
    })
}

fn lexical_outcome(
    session: &Session,
    config: &Config,
    query: &str,
    top_k: usize,
) -> RetrievalOutcome {
    RetrievalOutcome {
        results: lexical::score_chunks(query, session.chunks(), &config.retrieval, top_k),
        backend_used: SearchBackend::Lexical,
        index_kind: None,
    }
}

/// `ask` command: ingest the inputs, run one query, print the hits.
#[allow(clippy::too_many_arguments)]
pub async fn run_ask(
    config: &Config,
    query: &str,
    inputs: &[PathBuf],
    backend_override: Option<SearchBackend>,
    top_k_override: Option<usize>,
    model_override: Option<EmbeddingModelId>,
    json: bool,
) -> Result<()> {
    let backend = backend_override.unwrap_or(config.retrieval.backend);
    let top_k = top_k_override.unwrap_or(config.retrieval.top_k);
    let model = model_override.unwrap_or(config.embedding.model);

    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let config = config.clone();
    let query_owned = query.to_string();
    let inputs = inputs.to_vec();

    // Model loading and inference are CPU-bound; keep them off the
    // async runtime.
    let (session_id, outcome) =
        tokio::task::spawn_blocking(move || -> Result<(Uuid, RetrievalOutcome)> {
            let mut provider = EmbeddingProvider::from_config(&config.embedding);
            let session = ingest::build_session(&inputs, &config, backend, model, &mut provider)?;
            let outcome =
                retrieve(&session, &mut provider, &config, &query_owned, backend, top_k)?;
            Ok((session.id(), outcome))
        })
        .await
        .context("retrieval task failed")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.results)?);
        return Ok(());
    }

    println!("session: {}", session_id);
    if outcome.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    match outcome.index_kind {
        Some(kind) => println!("backend: {} ({})", outcome.backend_used, kind),
        None => println!("backend: {}", outcome.backend_used),
    }
    for (i, result) in outcome.results.iter().enumerate() {
        let location = match result.chunk.page {
            Some(page) => format!("{} p.{}", result.chunk.source, page),
            None => result.chunk.source.clone(),
        };
        println!("{}. [{:.2}] {}", i + 1, result.score, location);
        println!("    excerpt: \"{}\"", excerpt(&result.chunk.text));
        println!("    id: {}", result.chunk.id);
        println!();
    }

    Ok(())
}

/// One-line excerpt bounded to a fixed number of characters.
fn excerpt(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let trimmed = flat.trim();
    let mut out: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    if trimmed.chars().count() > EXCERPT_CHARS {
        out.push_str("...");
    }
    out
}
