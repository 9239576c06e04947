//! Chunkwise Core — error taxonomy, configuration, documents and chunk records.

pub mod chunk;
pub mod config;
pub mod document;
pub mod error;

pub use chunk::{Chunk, ChunkSet, ParentChunk, SourceSpan, StrategyKind};
pub use config::{
    ChunkingConfig, ChunkwiseConfig, DataPaths, EmbeddingConfig, ExtractionConfig,
    FixedParams, HierarchicalParams, PricingConfig, RetrievalConfig, SemanticParams,
};
pub use document::{Document, PageBoundary};
pub use error::{Error, Result};
