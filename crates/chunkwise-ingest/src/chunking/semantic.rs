//! Sentence-accumulating chunker.
//!
//! Sentences are added greedily until the chunk reaches `target_tokens`, or
//! until a paragraph break once it holds at least `min_tokens`. A sentence that
//! would push the chunk past `max_tokens` starts a new chunk instead. Chunk
//! boundaries always fall between sentences.

use chunkwise_core::chunk::chunk_id;
use chunkwise_core::{Chunk, ChunkSet, Document, Result, SemanticParams, SourceSpan, StrategyKind};

use super::{document_tokens, Chunker};
use crate::sentence::SentenceSplitter;
use crate::tokenizer::count_tokens;

pub(super) fn label(params: &SemanticParams) -> String {
    format!("semantic_{}", params.max_tokens)
}

pub struct SemanticChunker<'a> {
    params: SemanticParams,
    splitter: &'a dyn SentenceSplitter,
}

impl<'a> SemanticChunker<'a> {
    pub fn new(params: SemanticParams, splitter: &'a dyn SentenceSplitter) -> Self {
        Self { params, splitter }
    }
}

/// Sentences accumulated so far.
struct Pending {
    first: usize,
    last: usize,
    tokens: usize,
}

impl Chunker for SemanticChunker<'_> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SplitsBySentenceBoundary
    }

    fn name(&self) -> String {
        label(&self.params)
    }

    fn chunk(&self, document: &Document) -> Result<ChunkSet> {
        self.params.validate()?;
        document_tokens(document)?;

        let text = document.text();
        let name = self.name();
        let sentences = self.splitter.split(text);
        let counts: Vec<usize> = sentences
            .iter()
            .map(|s| count_tokens(&text[s.start..s.end]))
            .collect();

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut pending: Option<Pending> = None;

        let flush = |pending: &mut Option<Pending>, chunks: &mut Vec<Chunk>| {
            if let Some(p) = pending.take() {
                let span = SourceSpan::new(sentences[p.first].start, sentences[p.last].end);
                let position = chunks.len();
                chunks.push(Chunk {
                    id: chunk_id(&document.id, &name, position),
                    strategy: name.clone(),
                    text: text[span.start..span.end].to_string(),
                    token_count: p.tokens,
                    position,
                    parent_id: None,
                    source_span: span,
                });
            }
        };

        for (i, &tokens) in counts.iter().enumerate() {
            let current = pending.as_ref().map(|p| p.tokens).unwrap_or(0);
            if current > 0 && current + tokens > self.params.max_tokens {
                flush(&mut pending, &mut chunks);
            }

            match pending.as_mut() {
                Some(p) => {
                    p.last = i;
                    p.tokens += tokens;
                }
                None => {
                    pending = Some(Pending {
                        first: i,
                        last: i,
                        tokens,
                    })
                }
            }

            let current = pending.as_ref().map(|p| p.tokens).unwrap_or(0);
            let paragraph_ends = sentences
                .get(i + 1)
                .map(|next| {
                    text[sentences[i].end..next.start]
                        .chars()
                        .filter(|&c| c == '\n')
                        .count()
                        >= 2
                })
                .unwrap_or(false);

            if current >= self.params.target_tokens
                || (current >= self.params.min_tokens && paragraph_ends)
            {
                flush(&mut pending, &mut chunks);
            }
        }
        flush(&mut pending, &mut chunks);

        tracing::info!(
            "{}: {} chunks from {} sentences ({})",
            name,
            chunks.len(),
            sentences.len(),
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
    use crate::sentence::RegexSentenceSplitter;

    /// A sentence of exactly `n` tokens: n-1 words plus the period.
    fn sentence(n: usize, tag: usize) -> String {
        let words: Vec<String> = (0..n - 1).map(|i| format!("S{}w{}", tag, i)).collect();
        format!("{}.", words.join(" "))
    }

    fn params(min: usize, target: usize, max: usize) -> SemanticParams {
        SemanticParams {
            min_tokens: min,
            target_tokens: target,
            max_tokens: max,
        }
    }

    #[test]
    fn test_accumulates_to_target() {
        let text: Vec<String> = (0..10).map(|i| sentence(100, i)).collect();
        let doc = Document::from_text("doc", text.join(" "));
        let splitter = RegexSentenceSplitter::new();
        let set = SemanticChunker::new(SemanticParams::default(), &splitter)
            .chunk(&doc)
            .unwrap();

        // 3 sentences reach the 300 target, the last chunk holds the remaining one
        let counts: Vec<usize> = set.chunks.iter().map(|c| c.token_count).collect();
        assert_eq!(counts, vec![300, 300, 300, 100]);
        assert_eq!(set.strategy, "semantic_500");
    }

    #[test]
    fn test_never_exceeds_max_unless_single_sentence() {
        let sizes = [180, 250, 90, 600, 40, 260, 260];
        let text: Vec<String> = sizes.iter().enumerate().map(|(i, &n)| sentence(n, i)).collect();
        let doc = Document::from_text("doc", text.join(" "));
        let splitter = RegexSentenceSplitter::new();
        let set = SemanticChunker::new(SemanticParams::default(), &splitter)
            .chunk(&doc)
            .unwrap();

        for c in &set.chunks {
            if c.token_count > 500 {
                assert_eq!(c.token_count, 600);
                assert_eq!(splitter.split(&c.text).len(), 1);
            }
        }
        let total: usize = set.chunks.iter().map(|c| c.token_count).sum();
        assert_eq!(total, sizes.iter().sum::<usize>());
    }

    #[test]
    fn test_paragraph_break_respected_above_min() {
        let text = format!(
            "{} {}\n\n{}\n\n{}",
            sentence(120, 0),
            sentence(100, 1),
            sentence(50, 2),
            sentence(50, 3)
        );
        let doc = Document::from_text("doc", text);
        let splitter = RegexSentenceSplitter::new();
        let set = SemanticChunker::new(SemanticParams::default(), &splitter)
            .chunk(&doc)
            .unwrap();

        // 220 tokens at the first break (>= min), then 100 left below min
        let counts: Vec<usize> = set.chunks.iter().map(|c| c.token_count).collect();
        assert_eq!(counts, vec![220, 100]);
    }

    #[test]
    fn test_boundaries_fall_between_sentences() {
        let text: Vec<String> = (0..25).map(|i| sentence(30 + (i * 17) % 90, i)).collect();
        let doc = Document::from_text("doc", text.join("\n"));
        let splitter = RegexSentenceSplitter::new();
        let set = SemanticChunker::new(params(50, 80, 120), &splitter)
            .chunk(&doc)
            .unwrap();

        let sentences = splitter.split(doc.text());
        for s in &sentences {
            let owners = set
                .chunks
                .iter()
                .filter(|c| c.source_span.contains(s))
                .count();
            assert_eq!(owners, 1, "sentence {:?} split across chunks", s);
        }
        for pair in set.chunks.windows(2) {
            assert!(pair[0].source_span.end <= pair[1].source_span.start);
        }
    }

    #[test]
    fn test_positions_and_ids() {
        let text: Vec<String> = (0..6).map(|i| sentence(150, i)).collect();
        let doc = Document::from_text("doc", text.join(" "));
        let splitter = RegexSentenceSplitter::new();
        let set = SemanticChunker::new(SemanticParams::default(), &splitter)
            .chunk(&doc)
            .unwrap();
        for (i, c) in set.chunks.iter().enumerate() {
            assert_eq!(c.position, i);
            assert_eq!(c.id, format!("{}:semantic_500:{:05}", doc.id, i));
            assert!(c.parent_id.is_none());
        }
    }
}
