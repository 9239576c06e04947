//! Sliding token windows with overlap.

use chunkwise_core::chunk::chunk_id;
use chunkwise_core::{Chunk, ChunkSet, Document, FixedParams, Result, StrategyKind};

use super::{document_tokens, token_span, windows, Chunker};

pub struct FixedChunker {
    params: FixedParams,
}

impl FixedChunker {
    pub fn new(params: FixedParams) -> Self {
        Self { params }
    }
}

impl Chunker for FixedChunker {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SplitsByFixedWindow
    }

    fn name(&self) -> String {
        let overlap_pct = (self.params.overlap_fraction * 100.0).round() as usize;
        format!("fixed_{}_{}", self.params.target_tokens, overlap_pct)
    }

    fn chunk(&self, document: &Document) -> Result<ChunkSet> {
        self.params.validate()?;
        let tokens = document_tokens(document)?;
        let name = self.name();
        let text = document.text();

        let chunks: Vec<Chunk> = windows(
            tokens.len(),
            self.params.target_tokens,
            self.params.overlap_tokens(),
        )
        .into_iter()
        .enumerate()
        .map(|(position, range)| {
            let span = token_span(&tokens, &range);
            Chunk {
                id: chunk_id(&document.id, &name, position),
                strategy: name.clone(),
                text: text[span.start..span.end].to_string(),
                token_count: range.len(),
                position,
                parent_id: None,
                source_span: span,
            }
        })
        .collect();

        tracing::info!(
            "{}: {} chunks from {} tokens ({})",
            name,
            chunks.len(),
            tokens.len(),
            document.source
        );

        Ok(ChunkSet {
            strategy: name,
            chunks,
            parents: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_default_windows_overlap_by_sixty() {
        let doc = Document::from_text("doc", numbered_words(1000));
        let set = FixedChunker::new(FixedParams::default()).chunk(&doc).unwrap();

        // 1000 tokens, stride 240: starts at 0, 240, 480, 720
        assert_eq!(set.len(), 4);
        assert_eq!(set.strategy, "fixed_300_20");
        assert_eq!(set.chunks[0].token_count, 300);
        assert_eq!(set.chunks[3].token_count, 280);

        for pair in set.chunks.windows(2) {
            let overlap = &doc.text()[pair[1].source_span.start..pair[0].source_span.end];
            let shared = tokenize(overlap).len();
            assert!((59..=61).contains(&shared), "overlap was {}", shared);
        }
    }

    #[test]
    fn test_short_document_single_window() {
        let doc = Document::from_text("doc", "The borrower is TALF LLC.");
        let set = FixedChunker::new(FixedParams::default()).chunk(&doc).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.chunks[0].text, "The borrower is TALF LLC.");
        assert_eq!(set.chunks[0].token_count, 6);
        assert_eq!(set.chunks[0].id, format!("{}:fixed_300_20:00000", doc.id));
    }

    #[test]
    fn test_covers_every_non_whitespace_byte() {
        let doc = Document::from_text("doc", numbered_words(777));
        let set = FixedChunker::new(FixedParams {
            target_tokens: 50,
            overlap_fraction: 0.1,
        })
        .chunk(&doc)
        .unwrap();
        for (i, c) in doc.text().char_indices() {
            if !c.is_whitespace() {
                assert!(set.chunks.iter().any(|ch| ch.source_span.contains_offset(i)));
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let doc = Document::from_text("doc", numbered_words(500));
        let chunker = FixedChunker::new(FixedParams::default());
        let a = chunker.chunk(&doc).unwrap();
        let b = chunker.chunk(&doc).unwrap();
        assert_eq!(a.chunks, b.chunks);
    }
}
