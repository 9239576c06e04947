//! Chunk records shared by chunkers, stores, the retriever and the harness.

use serde::{Deserialize, Serialize};

/// Byte range into `Document::text`. Both ends sit on char boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `other` lies entirely inside this span.
    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Capability of a chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    SplitsByFixedWindow,
    SplitsBySentenceBoundary,
    SplitsHierarchically,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SplitsByFixedWindow => write!(f, "fixed"),
            Self::SplitsBySentenceBoundary => write!(f, "semantic"),
            Self::SplitsHierarchically => write!(f, "hierarchical"),
        }
    }
}

/// A retrievable unit of document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable id: `{doc_id}:{strategy}:{position:05}`.
    pub id: String,
    /// Namespace label of the strategy that produced this chunk.
    pub strategy: String,
    pub text: String,
    pub token_count: usize,
    /// Ordinal within the document (flat strategies) or the child sequence (hierarchical).
    pub position: usize,
    /// Id of the owning parent; only hierarchical children carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub source_span: SourceSpan,
}

/// Large context chunk that owns a run of hierarchical children.
///
/// Parents are never embedded; they are looked up by id after a child matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentChunk {
    pub id: String,
    pub text: String,
    pub token_count: usize,
    pub position: usize,
    pub source_span: SourceSpan,
    pub child_ids: Vec<String>,
}

/// Output of one chunker run over one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkSet {
    pub strategy: String,
    /// Indexed chunks in position order.
    pub chunks: Vec<Chunk>,
    /// Parent chunks (hierarchical only).
    #[serde(default)]
    pub parents: Vec<ParentChunk>,
}

impl ChunkSet {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_tokens(&self) -> usize {
        self.chunks.iter().map(|c| c.token_count).sum()
    }

    pub fn parent(&self, parent_id: &str) -> Option<&ParentChunk> {
        self.parents.iter().find(|p| p.id == parent_id)
    }
}

/// Deterministic chunk id.
pub fn chunk_id(doc_id: &str, strategy: &str, position: usize) -> String {
    format!("{}:{}:{:05}", doc_id, strategy, position)
}

/// Deterministic parent id.
pub fn parent_id(doc_id: &str, strategy: &str, position: usize) -> String {
    format!("{}:{}:parent:{:04}", doc_id, strategy, position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains() {
        let outer = SourceSpan::new(10, 100);
        assert!(outer.contains(&SourceSpan::new(10, 100)));
        assert!(outer.contains(&SourceSpan::new(20, 30)));
        assert!(!outer.contains(&SourceSpan::new(5, 30)));
        assert!(!outer.contains(&SourceSpan::new(90, 101)));
        assert!(outer.contains_offset(10));
        assert!(!outer.contains_offset(100));
    }

    #[test]
    fn test_ids_are_stable() {
        assert_eq!(chunk_id("abc", "fixed_300_20", 7), "abc:fixed_300_20:00007");
        assert_eq!(
            parent_id("abc", "hierarchical_1000_300", 2),
            "abc:hierarchical_1000_300:parent:0002"
        );
    }

    #[test]
    fn test_chunk_serializes_without_parent() {
        let chunk = Chunk {
            id: "d:s:00000".into(),
            strategy: "s".into(),
            text: "text".into(),
            token_count: 1,
            position: 0,
            parent_id: None,
            source_span: SourceSpan::new(0, 4),
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert!(json.get("parent_id").is_none());
        let back: Chunk = serde_json::from_value(json).unwrap();
        assert_eq!(back, chunk);
    }
}
