//! Retrieval result types.

use chunkwise_core::SourceSpan;
use serde::{Deserialize, Serialize};

/// A chunk returned by the retriever, possibly expanded to its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk id, or the parent id when expanded.
    pub id: String,
    pub text: String,
    pub token_count: usize,
    pub position: usize,
    pub source_span: SourceSpan,
    /// Cosine similarity of the matching chunk.
    pub score: f32,
    /// Id of the child that matched, when the result was expanded to a parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_child: Option<String>,
}

impl RetrievedChunk {
    pub fn is_expanded(&self) -> bool {
        self.matched_child.is_some()
    }
}
