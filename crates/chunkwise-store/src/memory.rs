//! In-process vector store.

use std::collections::{BTreeMap, HashMap};

use chunkwise_core::{Chunk, Error, Result};
use ndarray::{Array1, Array2};
use parking_lot::Mutex;
use tracing::debug;

use crate::types::{normalize_rows, rank, StoreHit, VectorStore};

#[derive(Default)]
struct Namespace {
    dimension: usize,
    chunks: Vec<Chunk>,
    vectors: Vec<Array1<f32>>,
    by_id: HashMap<String, usize>,
    /// Normalised rows, rebuilt lazily after writes.
    matrix: Option<Array2<f32>>,
}

impl Namespace {
    fn ensure_matrix(&mut self) {
        if self.matrix.is_none() {
            let mut m = Array2::zeros((self.vectors.len(), self.dimension));
            for (i, v) in self.vectors.iter().enumerate() {
                m.row_mut(i).assign(v);
            }
            normalize_rows(&mut m);
            self.matrix = Some(m);
        }
    }
}

/// Vector store held entirely in memory. Used by the evaluation harness and tests.
#[derive(Default)]
pub struct MemoryVectorStore {
    namespaces: Mutex<BTreeMap<String, Namespace>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for MemoryVectorStore {
    fn upsert(&self, namespace: &str, id: &str, vector: &Array1<f32>, chunk: &Chunk) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::Storage("empty vector".into()));
        }
        let mut namespaces = self.namespaces.lock();
        let ns = namespaces.entry(namespace.to_string()).or_insert_with(|| Namespace {
            dimension: vector.len(),
            ..Default::default()
        });
        if vector.len() != ns.dimension {
            return Err(Error::Storage(format!(
                "namespace {} has dimension {}, got {}",
                namespace,
                ns.dimension,
                vector.len()
            )));
        }

        let mut stored = chunk.clone();
        stored.id = id.to_string();
        match ns.by_id.get(id) {
            Some(&i) => {
                ns.chunks[i] = stored;
                ns.vectors[i] = vector.clone();
            }
            None => {
                ns.by_id.insert(id.to_string(), ns.chunks.len());
                ns.chunks.push(stored);
                ns.vectors.push(vector.clone());
            }
        }
        ns.matrix = None;
        Ok(())
    }

    fn query(&self, namespace: &str, vector: &Array1<f32>, k: usize) -> Result<Vec<StoreHit>> {
        let mut namespaces = self.namespaces.lock();
        let ns = namespaces
            .get_mut(namespace)
            .ok_or_else(|| Error::NotFound(format!("namespace {}", namespace)))?;
        if vector.len() != ns.dimension {
            return Err(Error::Storage(format!(
                "query dimension {} does not match namespace {} ({})",
                vector.len(),
                namespace,
                ns.dimension
            )));
        }
        ns.ensure_matrix();
        let hits = match &ns.matrix {
            Some(m) => rank(m, &ns.chunks, vector, k),
            None => Vec::new(),
        };
        debug!("{}: {} hits (k={})", namespace, hits.len(), k);
        Ok(hits)
    }

    fn delete_namespace(&self, namespace: &str) -> Result<bool> {
        Ok(self.namespaces.lock().remove(namespace).is_some())
    }

    fn count(&self, namespace: &str) -> Result<usize> {
        Ok(self
            .namespaces
            .lock()
            .get(namespace)
            .map(|ns| ns.chunks.len())
            .unwrap_or(0))
    }

    fn list_namespaces(&self) -> Result<Vec<String>> {
        Ok(self.namespaces.lock().keys().cloned().collect())
    }
}
