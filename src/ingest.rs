//! Ingestion pipeline: files in, an indexed [`Session`] out.
//!
//! One run extracts every input document, chunks the pages, and, when
//! the vector backend is requested, embeds the chunks and builds the
//! index. Per-document extraction failures skip that document with a
//! stderr notice and never abort the run; embedding failures leave the
//! session lexical-only rather than failing it.

use anyhow::Result;
use std::path::PathBuf;

use crate::chunker;
use crate::config::Config;
use crate::embedding::{EmbeddingModelId, EmbeddingProvider};
use crate::extract;
use crate::index::VectorIndex;
use crate::models::{Page, SearchBackend};
use crate::session::Session;

/// Chunks shown by the `chunks` preview command.
const PREVIEW_CHUNKS: usize = 3;
const PREVIEW_CHARS: usize = 160;

/// Extract pages from every input, skipping documents that fail.
pub fn extract_inputs(inputs: &[PathBuf]) -> Vec<Page> {
    let mut pages = Vec::new();
    for path in inputs {
        match extract::extract_pages(path) {
            Ok(mut extracted) => pages.append(&mut extracted),
            Err(err) => eprintln!("skipping {}: {}", path.display(), err),
        }
    }
    pages
}

/// Run the full pipeline for one set of inputs.
///
/// With the vector backend the chunks are embedded and indexed; a total
/// embedding failure (primary and fallback model both unusable) is
/// reported on stderr and the session stays lexical-only. With the
/// lexical backend no model is ever touched.
pub fn build_session(
    inputs: &[PathBuf],
    config: &Config,
    backend: SearchBackend,
    model: EmbeddingModelId,
    provider: &mut EmbeddingProvider,
) -> Result<Session> {
    let pages = extract_inputs(inputs);
    let chunks = chunker::split_pages(&pages, &config.chunking);

    let mut session = Session::new();
    session.replace_chunks(chunks);
    if session.chunks().is_empty() {
        eprintln!("no usable text extracted from the inputs");
        return Ok(session);
    }

    if backend == SearchBackend::Vector {
        let texts: Vec<String> = session.chunks().iter().map(|c| c.text.clone()).collect();
        match provider.embed(&texts, model) {
            Ok(matrix) => {
                let effective = provider.active_model().unwrap_or(model);
                let index = VectorIndex::build(&matrix);
                session.set_embeddings(matrix, effective)?;
                if let Some(index) = index {
                    session.set_index(index)?;
                }
            }
            Err(err) => {
                eprintln!("{}; session will use lexical scoring only", err);
            }
        }
    }

    Ok(session)
}

/// `chunks` command: extract and chunk the inputs, print a summary and a
/// short preview, index nothing.
pub fn run_chunks(config: &Config, inputs: &[PathBuf]) -> Result<()> {
    let mut total_pages = 0usize;
    let mut pages = Vec::new();
    for path in inputs {
        match extract::extract_pages(path) {
            Ok(extracted) => {
                println!(
                    "{}: {} page{}",
                    path.display(),
                    extracted.len(),
                    if extracted.len() == 1 { "" } else { "s" }
                );
                total_pages += extracted.len();
                pages.extend(extracted);
            }
            Err(err) => eprintln!("skipping {}: {}", path.display(), err),
        }
    }

    let chunks = chunker::split_pages(&pages, &config.chunking);
    println!(
        "Produced {} chunks from {} pages (chunk_size={}, overlap={})",
        chunks.len(),
        total_pages,
        config.chunking.chunk_size,
        config.chunking.overlap
    );

    if chunks.is_empty() {
        return Ok(());
    }

    println!();
    println!("First {} chunks:", PREVIEW_CHUNKS.min(chunks.len()));
    for chunk in chunks.iter().take(PREVIEW_CHUNKS) {
        let location = match chunk.page {
            Some(page) => format!("{} p.{}", chunk.source, page),
            None => chunk.source.clone(),
        };
        let preview: String = chunk
            .text
            .replace('\n', " ")
            .trim()
            .chars()
            .take(PREVIEW_CHARS)
            .collect();
        println!("[{}] {}", chunk.id, location);
        println!("    \"{}\"", preview);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{}", content).unwrap();
        path
    }

    fn long_text() -> String {
        "Checked baggage allowance is 23 kilograms per passenger on economy fares. "
            .repeat(20)
    }

    #[test]
    fn test_failed_inputs_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(&dir, "notes.txt", &long_text());
        let bad = dir.path().join("missing.txt");

        let pages = extract_inputs(&[bad, good]);
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_lexical_build_produces_chunked_session() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(&dir, "notes.txt", &long_text());
        let config = Config::default();
        let mut provider = EmbeddingProvider::disabled();

        let session = build_session(
            &[input],
            &config,
            SearchBackend::Lexical,
            EmbeddingModelId::AllMiniLmL6V2,
            &mut provider,
        )
        .unwrap();

        assert!(!session.chunks().is_empty());
        assert!(session.embeddings().is_none());
        assert!(session.index().is_none());
    }

    #[test]
    fn test_vector_build_with_disabled_provider_commits_zero_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_file(&dir, "notes.txt", &long_text());
        let config = Config::default();
        let mut provider = EmbeddingProvider::disabled();

        let session = build_session(
            &[input],
            &config,
            SearchBackend::Vector,
            EmbeddingModelId::AllMiniLmL6V2,
            &mut provider,
        )
        .unwrap();

        let matrix = session.embeddings().unwrap();
        assert_eq!(matrix.len(), session.chunks().len());
        assert!(crate::embedding::is_zero_matrix(matrix));
        assert!(session.index().is_some());
    }

    #[test]
    fn test_empty_inputs_yield_empty_session() {
        let config = Config::default();
        let mut provider = EmbeddingProvider::disabled();
        let session = build_session(
            &[],
            &config,
            SearchBackend::Vector,
            EmbeddingModelId::AllMiniLmL6V2,
            &mut provider,
        )
        .unwrap();
        assert!(session.chunks().is_empty());
    }
}
