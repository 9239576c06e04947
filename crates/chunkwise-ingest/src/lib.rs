//! Chunkwise Ingest — token estimation, sentence splitting, chunking strategies,
//! document sources.

pub mod chunking;
pub mod sentence;
pub mod source;
pub mod tokenizer;

pub use chunking::{
    ChunkStats, Chunker, ChunkingStrategy, FixedChunker, HierarchicalChunker, SemanticChunker,
};
pub use sentence::{RegexSentenceSplitter, SentenceSplitter};
pub use source::{DocumentSource, FileType, TextFileSource};
pub use tokenizer::{count_tokens, tokenize, Token};
