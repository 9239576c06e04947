//! Embedding service trait and the batching adapter in front of it.
//!
//! Implementations:
//! - `HashingEmbedder`: deterministic feature hashing, always available
//! - `OnnxEmbedder`: ONNX Runtime with all-MiniLM-L6-v2 (requires the `onnx` feature)

use std::sync::Arc;

use chunkwise_core::{Error, Result};
use ndarray::Array1;
use tracing::debug;

use crate::cache::QueryCache;

/// A text embedding backend.
pub trait EmbeddingService: Send + Sync {
    /// Embed a batch of texts, one vector per text in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Batches requests to an `EmbeddingService` and checks what comes back.
///
/// A failing batch fails the whole call; nothing is retried and no partial
/// results are returned.
pub struct EmbeddingAdapter {
    service: Arc<dyn EmbeddingService>,
    batch_size: usize,
    cache: QueryCache,
}

impl EmbeddingAdapter {
    pub fn new(service: Arc<dyn EmbeddingService>, batch_size: usize) -> Self {
        Self {
            service,
            batch_size: batch_size.max(1),
            cache: QueryCache::default_cache(),
        }
    }

    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn dimension(&self) -> usize {
        self.service.dimension()
    }

    pub fn model_name(&self) -> &str {
        self.service.model_name()
    }

    /// Embed texts in batches, preserving input order.
    pub fn embed(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        let dim = self.service.dimension();
        let mut vectors = Vec::with_capacity(texts.len());

        for (n, batch) in texts.chunks(self.batch_size).enumerate() {
            let out = self.service.embed_batch(batch).map_err(|e| match e {
                Error::EmbeddingService(msg) => {
                    Error::EmbeddingService(format!("batch {}: {}", n, msg))
                }
                other => Error::EmbeddingService(format!("batch {}: {}", n, other)),
            })?;

            if out.len() != batch.len() {
                return Err(Error::EmbeddingService(format!(
                    "batch {}: expected {} vectors, got {}",
                    n,
                    batch.len(),
                    out.len()
                )));
            }
            if let Some(bad) = out.iter().find(|v| v.len() != dim) {
                return Err(Error::EmbeddingService(format!(
                    "batch {}: expected dimension {}, got {}",
                    n,
                    dim,
                    bad.len()
                )));
            }
            vectors.extend(out);
        }

        debug!(
            "Embedded {} texts in {} batches ({})",
            texts.len(),
            texts.len().div_ceil(self.batch_size),
            self.service.model_name()
        );
        Ok(vectors)
    }

    /// Embed a single query, served from the cache when possible.
    pub fn embed_query(&self, query: &str) -> Result<Array1<f32>> {
        if let Some(cached) = self.cache.get(query) {
            return Ok(cached);
        }
        let mut out = self.embed(&[query])?;
        let embedding = out
            .pop()
            .ok_or_else(|| Error::EmbeddingService("empty response for query".into()))?;
        self.cache.put(query.to_string(), embedding.clone());
        Ok(embedding)
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }
}
