//! Chunking strategies.
//!
//! Three strategies share one contract, `Chunker::chunk(document) -> ChunkSet`:
//! - Fixed: sliding token windows with a configurable overlap
//! - Semantic: sentences accumulated between min/target/max token bounds
//! - Hierarchical: 1000-token parents split into 300-token children; only
//!   the children are indexed
//!
//! `ChunkingStrategy` is the closed set selected by configuration.

mod fixed;
mod hierarchical;
mod semantic;
mod stats;

pub use fixed::FixedChunker;
pub use hierarchical::HierarchicalChunker;
pub use semantic::SemanticChunker;
pub use stats::ChunkStats;

use std::ops::Range;

use chunkwise_core::{
    ChunkSet, ChunkingConfig, Document, Error, FixedParams, HierarchicalParams, Result,
    SemanticParams, SourceSpan, StrategyKind,
};

use crate::sentence::{RegexSentenceSplitter, SentenceSplitter};
use crate::tokenizer::{tokenize, Token};

/// Capability shared by every chunking strategy.
pub trait Chunker {
    fn kind(&self) -> StrategyKind;

    /// Namespace label, e.g. `fixed_300_20`.
    fn name(&self) -> String;

    fn chunk(&self, document: &Document) -> Result<ChunkSet>;
}

/// Strategy selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChunkingStrategy {
    Fixed(FixedParams),
    Semantic(SemanticParams),
    Hierarchical(HierarchicalParams),
}

impl ChunkingStrategy {
    /// All three strategies with the configured parameters.
    pub fn all(config: &ChunkingConfig) -> Vec<ChunkingStrategy> {
        vec![
            Self::Fixed(config.fixed),
            Self::Semantic(config.semantic),
            Self::Hierarchical(config.hierarchical),
        ]
    }

    /// Parse a strategy kind ("fixed", "semantic", "hierarchical") using configured parameters.
    pub fn from_kind(kind: &str, config: &ChunkingConfig) -> Result<ChunkingStrategy> {
        match kind.to_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed(config.fixed)),
            "semantic" => Ok(Self::Semantic(config.semantic)),
            "hierarchical" => Ok(Self::Hierarchical(config.hierarchical)),
            other => Err(Error::InvalidParameters(format!(
                "unknown strategy '{}'",
                other
            ))),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Fixed(_) => StrategyKind::SplitsByFixedWindow,
            Self::Semantic(_) => StrategyKind::SplitsBySentenceBoundary,
            Self::Hierarchical(_) => StrategyKind::SplitsHierarchically,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::Fixed(p) => FixedChunker::new(*p).name(),
            Self::Semantic(p) => semantic::label(p),
            Self::Hierarchical(p) => HierarchicalChunker::new(*p).name(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Fixed(p) => p.validate(),
            Self::Semantic(p) => p.validate(),
            Self::Hierarchical(p) => p.validate(),
        }
    }

    /// Chunk with the bundled sentence splitter.
    pub fn chunk(&self, document: &Document) -> Result<ChunkSet> {
        self.chunk_with(document, &RegexSentenceSplitter::new())
    }

    /// Chunk with a caller-supplied sentence splitter (used by Semantic only).
    pub fn chunk_with(
        &self,
        document: &Document,
        splitter: &dyn SentenceSplitter,
    ) -> Result<ChunkSet> {
        match self {
            Self::Fixed(p) => FixedChunker::new(*p).chunk(document),
            Self::Semantic(p) => SemanticChunker::new(*p, splitter).chunk(document),
            Self::Hierarchical(p) => HierarchicalChunker::new(*p).chunk(document),
        }
    }
}

/// Tokenize a document, rejecting documents with nothing to chunk.
fn document_tokens(document: &Document) -> Result<Vec<Token>> {
    let tokens = tokenize(document.text());
    if tokens.is_empty() {
        return Err(Error::InvalidDocument(format!(
            "{} has no extractable tokens",
            document.source
        )));
    }
    Ok(tokens)
}

/// Token-index windows of `size` tokens where each window starts `overlap`
/// tokens before the previous one ended. The last window may be shorter.
fn windows(token_count: usize, size: usize, overlap: usize) -> Vec<Range<usize>> {
    debug_assert!(size > overlap);
    let mut out = Vec::new();
    let mut start = 0;
    while start < token_count {
        let end = (start + size).min(token_count);
        out.push(start..end);
        if end == token_count {
            break;
        }
        start = end - overlap;
    }
    out
}

/// Byte span covered by a run of tokens.
fn token_span(tokens: &[Token], range: &Range<usize>) -> SourceSpan {
    SourceSpan::new(tokens[range.start].start, tokens[range.end - 1].end)
}
