//! Chunkwise Infer — embedding services, batching adapter, query cache.
//!
//! `EmbeddingService` is the backend seam. `HashingEmbedder` is always
//! available; with the `onnx` feature and model files present,
//! `OnnxEmbedder` produces all-MiniLM-L6-v2 sentence embeddings instead.

pub mod cache;
pub mod embedder;
pub mod hashing;
pub mod onnx_embedder;

pub use cache::QueryCache;
pub use embedder::{EmbeddingAdapter, EmbeddingService};
pub use hashing::HashingEmbedder;

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::sync::Arc;

use chunkwise_core::EmbeddingConfig;

/// Create the best available embedding service for the configuration.
///
/// Tries ONNX first (feature enabled and `model_dir` set), falling back to
/// the hashing embedder at the configured dimension.
pub fn create_embedder(config: &EmbeddingConfig) -> Arc<dyn EmbeddingService> {
    #[cfg(feature = "onnx")]
    {
        if let Some(dir) = &config.model_dir {
            match OnnxEmbedder::load(dir) {
                Ok(embedder) => {
                    tracing::info!(
                        "Using ONNX embedder (dim={})",
                        embedder.dimension()
                    );
                    return Arc::new(embedder);
                }
                Err(e) => {
                    tracing::warn!("ONNX embedder unavailable: {}. Falling back to hashing.", e);
                }
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        if config.model_dir.is_some() {
            tracing::info!("ONNX feature disabled; ignoring model_dir");
        }
    }

    tracing::info!("Using hashing embedder (dim={})", config.dimension);
    Arc::new(HashingEmbedder::new(config.dimension))
}
