//! Parent/child chunking.
//!
//! Parents are non-overlapping windows of `parent_tokens`; each parent is cut
//! into non-overlapping children of `child_tokens`. Children are the indexed
//! unit and point back at their parent by id.

use chunkwise_core::chunk::{chunk_id, parent_id};
use chunkwise_core::{
    Chunk, ChunkSet, Document, HierarchicalParams, ParentChunk, Result, StrategyKind,
};

use super::{document_tokens, token_span, windows, Chunker};

pub struct HierarchicalChunker {
    params: HierarchicalParams,
}

impl HierarchicalChunker {
    pub fn new(params: HierarchicalParams) -> Self {
        Self { params }
    }
}

impl Chunker for HierarchicalChunker {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SplitsHierarchically
    }

    fn name(&self) -> String {
        format!(
            "hierarchical_{}_{}",
            self.params.parent_tokens, self.params.child_tokens
        )
    }

    fn chunk(&self, document: &Document) -> Result<ChunkSet> {
        self.params.validate()?;
        let tokens = document_tokens(document)?;
        let name = self.name();
        let text = document.text();

        let mut parents = Vec::new();
        let mut children = Vec::new();

        for (parent_pos, parent_range) in windows(tokens.len(), self.params.parent_tokens, 0)
            .into_iter()
            .enumerate()
        {
            let pid = parent_id(&document.id, &name, parent_pos);
            let mut child_ids = Vec::new();

            for child in windows(parent_range.len(), self.params.child_tokens, 0) {
                let range = (parent_range.start + child.start)..(parent_range.start + child.end);
                let span = token_span(&tokens, &range);
                let position = children.len();
                let id = chunk_id(&document.id, &name, position);
                child_ids.push(id.clone());
                children.push(Chunk {
                    id,
                    strategy: name.clone(),
                    text: text[span.start..span.end].to_string(),
                    token_count: range.len(),
                    position,
                    parent_id: Some(pid.clone()),
                    source_span: span,
                });
            }

            let span = token_span(&tokens, &parent_range);
            parents.push(ParentChunk {
                id: pid,
                text: text[span.start..span.end].to_string(),
                token_count: parent_range.len(),
                position: parent_pos,
                source_span: span,
                child_ids,
            });
        }

        tracing::info!(
            "{}: {} parents, {} children ({})",
            name,
            parents.len(),
            children.len(),
            document.source
        );

        Ok(ChunkSet {
            strategy: name,
            chunks: children,
            parents,
        })
    }
}
