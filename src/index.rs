//! In-memory vector index over L2-normalized embeddings.
//!
//! Two variants exist behind one type. The flat index (compiled in with
//! the `flat-index` feature) stores the embedding matrix flattened
//! row-major and scores queries by inner product, which equals cosine
//! similarity for normalized rows. Without the feature, the matrix
//! variant keeps the raw rows and computes the same inner products
//! directly, so search results are identical either way.

use anyhow::{bail, Result};

/// An index built over a fixed embedding matrix.
#[derive(Debug, Clone)]
pub enum VectorIndex {
    /// Flattened row-major matrix with precomputed shape.
    #[cfg(feature = "flat-index")]
    Flat {
        dims: usize,
        rows: usize,
        data: Vec<f32>,
    },
    /// Raw embedding rows, scanned directly at query time.
    Matrix { rows: Vec<Vec<f32>> },
}

impl VectorIndex {
    /// Build an index over the given embedding rows.
    ///
    /// Returns `None` for an empty matrix: there is nothing to search,
    /// and callers should treat the session as vector-incapable. Rows
    /// must share one width; [`crate::session::Session::set_embeddings`]
    /// rejects ragged matrices before any index is attached.
    pub fn build(embeddings: &[Vec<f32>]) -> Option<VectorIndex> {
        if embeddings.is_empty() {
            return None;
        }
        #[cfg(feature = "flat-index")]
        {
            let dims = embeddings[0].len();
            let rows = embeddings.len();
            let mut data = Vec::with_capacity(rows * dims);
            for row in embeddings {
                data.extend_from_slice(row);
            }
            Some(VectorIndex::Flat { dims, rows, data })
        }
        #[cfg(not(feature = "flat-index"))]
        {
            Some(VectorIndex::Matrix {
                rows: embeddings.to_vec(),
            })
        }
    }

    /// Number of indexed rows.
    pub fn len(&self) -> usize {
        match self {
            #[cfg(feature = "flat-index")]
            VectorIndex::Flat { rows, .. } => *rows,
            VectorIndex::Matrix { rows } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimensionality the index was built with.
    pub fn dims(&self) -> usize {
        match self {
            #[cfg(feature = "flat-index")]
            VectorIndex::Flat { dims, .. } => *dims,
            VectorIndex::Matrix { rows } => rows.first().map(|r| r.len()).unwrap_or(0),
        }
    }

    /// Name of the active index variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "flat-index")]
            VectorIndex::Flat { .. } => "flat",
            VectorIndex::Matrix { .. } => "matrix",
        }
    }

    /// Exact top-k search by inner product.
    ///
    /// Returns up to `min(k, len)` `(row, score)` pairs in descending
    /// score order; ties keep the lower row index first. Never pads with
    /// placeholder entries.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        if query.len() != self.dims() {
            bail!(
                "query dimension {} does not match index dimension {}",
                query.len(),
                self.dims()
            );
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = match self {
            #[cfg(feature = "flat-index")]
            VectorIndex::Flat { dims, rows, data } => (0..*rows)
                .map(|i| {
                    let row = &data[i * dims..(i + 1) * dims];
                    (i, dot(row, query))
                })
                .collect(),
            VectorIndex::Matrix { rows } => rows
                .iter()
                .enumerate()
                .map(|(i, row)| (i, dot(row, query)))
                .collect(),
        };

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k.min(self.len()));
        Ok(scored)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(dims: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dims];
        v[hot] = 1.0;
        v
    }

    #[test]
    fn test_build_empty_matrix_returns_none() {
        assert!(VectorIndex::build(&[]).is_none());
    }

    #[test]
    fn test_search_ranks_by_inner_product() {
        let rows = vec![unit(4, 0), unit(4, 1), unit(4, 2)];
        let index = VectorIndex::build(&rows).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.dims(), 4);

        let results = index.search(&unit(4, 1), 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert!(results[0].1 > results[1].1);
    }

    #[test]
    fn test_k_larger_than_index_returns_all_without_padding() {
        let rows = vec![unit(3, 0), unit(3, 2)];
        let index = VectorIndex::build(&rows).unwrap();
        let results = index.search(&unit(3, 0), 10).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_k_zero_returns_empty() {
        let index = VectorIndex::build(&[unit(3, 0)]).unwrap();
        assert!(index.search(&unit(3, 0), 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let index = VectorIndex::build(&[unit(4, 0)]).unwrap();
        assert!(index.search(&unit(3, 0), 1).is_err());
    }

    #[test]
    fn test_tied_scores_keep_row_order() {
        let rows = vec![unit(2, 0), unit(2, 0), unit(2, 0)];
        let index = VectorIndex::build(&rows).unwrap();
        let results = index.search(&unit(2, 0), 3).unwrap();
        let order: Vec<usize> = results.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_matrix_variant_agrees_with_build() {
        let rows = vec![
            vec![0.6, 0.8, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.8, 0.0, 0.6],
        ];
        let built = VectorIndex::build(&rows).unwrap();
        let matrix = VectorIndex::Matrix { rows: rows.clone() };
        let query = vec![0.0, 0.6, 0.8];

        let a = built.search(&query, 3).unwrap();
        let b = matrix.search(&query, 3).unwrap();
        assert_eq!(a.len(), b.len());
        for ((ia, sa), (ib, sb)) in a.iter().zip(b.iter()) {
            assert_eq!(ia, ib);
            assert!((sa - sb).abs() < 1e-6);
        }
    }

    #[test]
    fn test_zero_query_scores_everything_zero() {
        let rows = vec![unit(2, 0), unit(2, 1)];
        let index = VectorIndex::build(&rows).unwrap();
        let results = index.search(&[0.0, 0.0], 2).unwrap();
        assert!(results.iter().all(|(_, s)| *s == 0.0));
    }
}
