//! In-memory session state for one indexing run.
//!
//! A [`Session`] carries the artifacts of the pipeline in dependency
//! order: chunks, then their embedding matrix, then the vector index
//! built over that matrix. Mutations enforce the shape invariants
//! (one embedding row per chunk, index rows match the matrix) and
//! invalidate downstream artifacts whenever an upstream one changes,
//! so a stale index can never serve a query against new chunks.

use anyhow::{bail, Result};
use uuid::Uuid;

use crate::embedding::EmbeddingModelId;
use crate::index::VectorIndex;
use crate::models::Chunk;

/// How far through the pipeline this session has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// No chunks yet.
    Empty,
    /// Chunks exist, no embeddings.
    Chunked,
    /// Embedding matrix committed, no index.
    Embedded,
    /// Vector index built and consistent.
    Indexed,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    chunks: Vec<Chunk>,
    embeddings: Option<Vec<Vec<f32>>>,
    index: Option<VectorIndex>,
    embedded_with: Option<EmbeddingModelId>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            chunks: Vec::new(),
            embeddings: None,
            index: None,
            embedded_with: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn embeddings(&self) -> Option<&Vec<Vec<f32>>> {
        self.embeddings.as_ref()
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    /// The model the committed embedding matrix was produced with.
    pub fn embedded_with(&self) -> Option<EmbeddingModelId> {
        self.embedded_with
    }

    pub fn readiness(&self) -> Readiness {
        if self.chunks.is_empty() {
            Readiness::Empty
        } else if self.embeddings.is_none() {
            Readiness::Chunked
        } else if self.index.is_none() {
            Readiness::Embedded
        } else {
            Readiness::Indexed
        }
    }

    /// Replace the chunk set, invalidating embeddings and index.
    pub fn replace_chunks(&mut self, chunks: Vec<Chunk>) {
        self.chunks = chunks;
        self.embeddings = None;
        self.index = None;
        self.embedded_with = None;
    }

    /// Commit an embedding matrix for the current chunks.
    ///
    /// Rejects a matrix whose row count does not match the chunk count,
    /// or whose rows differ in width; on rejection the session is left
    /// unchanged. A committed matrix invalidates any existing index.
    pub fn set_embeddings(
        &mut self,
        embeddings: Vec<Vec<f32>>,
        model: EmbeddingModelId,
    ) -> Result<()> {
        if embeddings.len() != self.chunks.len() {
            bail!(
                "embedding matrix has {} rows but session has {} chunks",
                embeddings.len(),
                self.chunks.len()
            );
        }
        if let Some(first) = embeddings.first() {
            let dims = first.len();
            if let Some(row) = embeddings.iter().position(|r| r.len() != dims) {
                bail!(
                    "embedding matrix row {} has width {} but row 0 has width {}",
                    row,
                    embeddings[row].len(),
                    dims
                );
            }
        }
        self.embeddings = Some(embeddings);
        self.embedded_with = Some(model);
        self.index = None;
        Ok(())
    }

    /// Commit a vector index built over the committed embedding matrix.
    pub fn set_index(&mut self, index: VectorIndex) -> Result<()> {
        let rows = match &self.embeddings {
            Some(matrix) => matrix.len(),
            None => bail!("cannot attach an index to a session without embeddings"),
        };
        if index.len() != rows {
            bail!(
                "index has {} rows but embedding matrix has {}",
                index.len(),
                rows
            );
        }
        self.index = Some(index);
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: format!("text of {}", id),
            source: "doc.txt".to_string(),
            page: None,
        }
    }

    fn matrix(rows: usize) -> Vec<Vec<f32>> {
        (0..rows).map(|i| vec![i as f32, 1.0]).collect()
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert_eq!(session.readiness(), Readiness::Empty);
        assert!(session.chunks().is_empty());
        assert!(session.embeddings().is_none());
        assert!(session.index().is_none());
    }

    #[test]
    fn test_pipeline_progresses_through_states() {
        let mut session = Session::new();
        session.replace_chunks(vec![chunk("ch0"), chunk("ch1")]);
        assert_eq!(session.readiness(), Readiness::Chunked);

        session
            .set_embeddings(matrix(2), EmbeddingModelId::AllMiniLmL6V2)
            .unwrap();
        assert_eq!(session.readiness(), Readiness::Embedded);
        assert_eq!(
            session.embedded_with(),
            Some(EmbeddingModelId::AllMiniLmL6V2)
        );

        let index = VectorIndex::build(session.embeddings().unwrap()).unwrap();
        session.set_index(index).unwrap();
        assert_eq!(session.readiness(), Readiness::Indexed);
    }

    #[test]
    fn test_row_count_mismatch_rejected_without_mutation() {
        let mut session = Session::new();
        session.replace_chunks(vec![chunk("ch0"), chunk("ch1")]);

        let result = session.set_embeddings(matrix(3), EmbeddingModelId::AllMiniLmL6V2);
        assert!(result.is_err());
        assert!(session.embeddings().is_none());
        assert_eq!(session.readiness(), Readiness::Chunked);
    }

    #[test]
    fn test_ragged_matrix_rejected_without_mutation() {
        let mut session = Session::new();
        session.replace_chunks(vec![chunk("ch0"), chunk("ch1")]);

        let ragged = vec![vec![1.0, 0.0], vec![0.0, 1.0, 0.0]];
        let result = session.set_embeddings(ragged, EmbeddingModelId::AllMiniLmL6V2);
        assert!(result.is_err());
        assert!(session.embeddings().is_none());
        assert_eq!(session.readiness(), Readiness::Chunked);
    }

    #[test]
    fn test_replacing_chunks_invalidates_downstream() {
        let mut session = Session::new();
        session.replace_chunks(vec![chunk("ch0")]);
        session
            .set_embeddings(matrix(1), EmbeddingModelId::AllMiniLmL6V2)
            .unwrap();
        let index = VectorIndex::build(session.embeddings().unwrap()).unwrap();
        session.set_index(index).unwrap();
        assert_eq!(session.readiness(), Readiness::Indexed);

        session.replace_chunks(vec![chunk("ch0"), chunk("ch1")]);
        assert_eq!(session.readiness(), Readiness::Chunked);
        assert!(session.embeddings().is_none());
        assert!(session.index().is_none());
        assert!(session.embedded_with().is_none());
    }

    #[test]
    fn test_new_embeddings_invalidate_index() {
        let mut session = Session::new();
        session.replace_chunks(vec![chunk("ch0")]);
        session
            .set_embeddings(matrix(1), EmbeddingModelId::AllMiniLmL6V2)
            .unwrap();
        let index = VectorIndex::build(session.embeddings().unwrap()).unwrap();
        session.set_index(index).unwrap();

        session
            .set_embeddings(matrix(1), EmbeddingModelId::AllMiniLmL6V2Q)
            .unwrap();
        assert!(session.index().is_none());
        assert_eq!(session.readiness(), Readiness::Embedded);
    }

    #[test]
    fn test_index_without_embeddings_rejected() {
        let mut session = Session::new();
        session.replace_chunks(vec![chunk("ch0")]);
        let index = VectorIndex::build(&matrix(1)).unwrap();
        assert!(session.set_index(index).is_err());
    }

    #[test]
    fn test_index_row_mismatch_rejected() {
        let mut session = Session::new();
        session.replace_chunks(vec![chunk("ch0"), chunk("ch1")]);
        session
            .set_embeddings(matrix(2), EmbeddingModelId::AllMiniLmL6V2)
            .unwrap();
        let wrong = VectorIndex::build(&matrix(1)).unwrap();
        assert!(session.set_index(wrong).is_err());
    }
}
