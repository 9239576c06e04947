//! Per-strategy index handles over a shared `VectorStore`.
//!
//! Each strategy gets its own namespace. Building an index replaces the
//! namespace wholesale; afterwards the handle is read-only.

use std::collections::HashMap;
use std::sync::Arc;

use chunkwise_core::{ChunkSet, Error, ParentChunk, Result, StrategyKind};
use ndarray::Array1;
use tracing::info;

use crate::types::{StoreHit, VectorStore};

/// Handle to one strategy's indexed chunks.
#[derive(Debug, Clone)]
pub struct StrategyIndex {
    pub namespace: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub kind: StrategyKind,
    parents: HashMap<String, ParentChunk>,
}

impl StrategyIndex {
    pub fn parent(&self, parent_id: &str) -> Option<&ParentChunk> {
        self.parents.get(parent_id)
    }

    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }

    pub fn is_hierarchical(&self) -> bool {
        self.kind == StrategyKind::SplitsHierarchically
    }
}

pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
}

impl VectorIndex {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Replace the strategy's namespace with `chunks`, one vector per chunk.
    ///
    /// Every failure is reported as `IndexBuild`.
    pub fn build(
        &self,
        strategy_name: &str,
        kind: StrategyKind,
        chunks: &ChunkSet,
        vectors: &[Array1<f32>],
    ) -> Result<StrategyIndex> {
        if chunks.chunks.len() != vectors.len() {
            return Err(Error::IndexBuild(format!(
                "{}: {} chunks but {} vectors",
                strategy_name,
                chunks.chunks.len(),
                vectors.len()
            )));
        }
        let dimension = vectors.first().map(|v| v.len()).unwrap_or(0);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(Error::IndexBuild(format!(
                "{}: mixed vector dimensions {} and {}",
                strategy_name,
                dimension,
                bad.len()
            )));
        }

        let build_err = |e: Error| Error::IndexBuild(format!("{}: {}", strategy_name, e));

        self.store.delete_namespace(strategy_name).map_err(build_err)?;
        for (chunk, vector) in chunks.chunks.iter().zip(vectors) {
            self.store
                .upsert(strategy_name, &chunk.id, vector, chunk)
                .map_err(build_err)?;
        }

        info!(
            "Indexed {} chunks into {} (dim={}, parents={})",
            chunks.chunks.len(),
            strategy_name,
            dimension,
            chunks.parents.len()
        );

        Ok(StrategyIndex {
            namespace: strategy_name.to_string(),
            dimension,
            chunk_count: chunks.chunks.len(),
            kind,
            parents: parent_table(chunks),
        })
    }

    /// Handle for a namespace built earlier (e.g. persisted in SQLite), using
    /// the same chunk set for the parent table.
    ///
    /// Fails with `NotFound` unless the stored count matches the chunk set.
    pub fn attach(
        &self,
        strategy_name: &str,
        kind: StrategyKind,
        chunks: &ChunkSet,
        dimension: usize,
    ) -> Result<StrategyIndex> {
        let stored = self.store.count(strategy_name)?;
        if stored == 0 || stored != chunks.chunks.len() {
            return Err(Error::NotFound(format!(
                "{}: {} stored vectors for {} chunks",
                strategy_name,
                stored,
                chunks.chunks.len()
            )));
        }
        Ok(StrategyIndex {
            namespace: strategy_name.to_string(),
            dimension,
            chunk_count: stored,
            kind,
            parents: parent_table(chunks),
        })
    }

    /// Top-`k` chunks of one strategy for a query vector.
    pub fn query(&self, index: &StrategyIndex, vector: &Array1<f32>, k: usize) -> Result<Vec<StoreHit>> {
        self.store.query(&index.namespace, vector, k)
    }
}

fn parent_table(chunks: &ChunkSet) -> HashMap<String, ParentChunk> {
    chunks
        .parents
        .iter()
        .map(|p| (p.id.clone(), p.clone()))
        .collect()
}
