//! Vector store contract and ranking shared by every backend.

use std::cmp::Ordering;

use chunkwise_core::{Chunk, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A ranked query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreHit {
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

/// Namespaced vector storage with cosine similarity search.
///
/// Each namespace fixes its dimension with the first vector written to it.
pub trait VectorStore: Send + Sync {
    /// Insert or replace the vector stored under `id`.
    fn upsert(&self, namespace: &str, id: &str, vector: &Array1<f32>, chunk: &Chunk) -> Result<()>;

    /// Top-`k` chunks by cosine similarity. Ties break by position, then id.
    fn query(&self, namespace: &str, vector: &Array1<f32>, k: usize) -> Result<Vec<StoreHit>>;

    /// Drop a namespace. Returns whether it existed.
    fn delete_namespace(&self, namespace: &str) -> Result<bool>;

    fn count(&self, namespace: &str) -> Result<usize>;

    fn list_namespaces(&self) -> Result<Vec<String>>;
}

/// L2-normalise rows in place so a dot product is a cosine.
pub(crate) fn normalize_rows(matrix: &mut Array2<f32>) {
    for mut row in matrix.rows_mut() {
        let norm = row.dot(&row).sqrt();
        if norm > 1e-9 {
            row /= norm;
        }
    }
}

/// Normalised copy of a query vector, or None for a zero vector.
pub(crate) fn normalized_query(vector: &Array1<f32>) -> Option<Array1<f32>> {
    let norm = vector.dot(vector).sqrt();
    if norm < 1e-9 {
        None
    } else {
        Some(vector / norm)
    }
}

/// Score every row against `query` and keep the best `k`.
///
/// `rows` is normalised, `chunks[i]` belongs to row `i`.
pub(crate) fn rank(rows: &Array2<f32>, chunks: &[Chunk], query: &Array1<f32>, k: usize) -> Vec<StoreHit> {
    if rows.nrows() == 0 || k == 0 {
        return Vec::new();
    }
    let scores = match normalized_query(query) {
        Some(q) => rows.dot(&q),
        None => Array1::zeros(rows.nrows()),
    };

    let mut order: Vec<usize> = (0..chunks.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
            .then_with(|| chunks[a].position.cmp(&chunks[b].position))
            .then_with(|| chunks[a].id.cmp(&chunks[b].id))
    });
    order.truncate(k);

    order
        .into_iter()
        .map(|i| StoreHit {
            chunk: chunks[i].clone(),
            score: scores[i],
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chunkwise_core::{Chunk, SourceSpan};
    use ndarray::Array1;

    pub fn chunk(ns: &str, position: usize) -> Chunk {
        Chunk {
            id: format!("doc:{}:{:05}", ns, position),
            strategy: ns.to_string(),
            text: format!("chunk {}", position),
            token_count: 2,
            position,
            parent_id: None,
            source_span: SourceSpan::new(position * 10, position * 10 + 7),
        }
    }

    /// Unit-ish vector pointing mostly along `axis`.
    pub fn axis(dim: usize, axis: usize, lean: f32) -> Array1<f32> {
        let mut v = Array1::zeros(dim);
        v[axis] = 1.0;
        v[(axis + 1) % dim] = lean;
        v
    }
}
