//! Chunkwise Resolve — turns field questions into ranked document chunks.
//!
//! The `Retriever` embeds a question, queries one strategy's index and, for
//! hierarchical indexes, swaps matching children for their parent context.

pub mod retriever;
pub mod types;

pub use retriever::{combine_context, Retriever};
pub use types::RetrievedChunk;
