use serde::{Deserialize, Serialize};

use chunkwise_core::Chunk;

/// Size distribution of a chunk set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkStats {
    pub num_chunks: usize,
    pub total_tokens: usize,
    pub avg_tokens: f64,
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub total_chars: usize,
    pub avg_chars: f64,
}

impl ChunkStats {
    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        if chunks.is_empty() {
            return Self::default();
        }
        let n = chunks.len();
        let total_tokens: usize = chunks.iter().map(|c| c.token_count).sum();
        let total_chars: usize = chunks.iter().map(|c| c.text.chars().count()).sum();
        Self {
            num_chunks: n,
            total_tokens,
            avg_tokens: total_tokens as f64 / n as f64,
            min_tokens: chunks.iter().map(|c| c.token_count).min().unwrap_or(0),
            max_tokens: chunks.iter().map(|c| c.token_count).max().unwrap_or(0),
            total_chars,
            avg_chars: total_chars as f64 / n as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkwise_core::SourceSpan;

    fn chunk(text: &str, tokens: usize) -> Chunk {
        Chunk {
            id: String::new(),
            strategy: "s".into(),
            text: text.into(),
            token_count: tokens,
            position: 0,
            parent_id: None,
            source_span: SourceSpan::new(0, text.len()),
        }
    }

    #[test]
    fn test_stats() {
        let stats = ChunkStats::from_chunks(&[chunk("abcd", 2), chunk("ab", 4), chunk("abcdef", 6)]);
        assert_eq!(stats.num_chunks, 3);
        assert_eq!(stats.total_tokens, 12);
        assert_eq!(stats.avg_tokens, 4.0);
        assert_eq!(stats.min_tokens, 2);
        assert_eq!(stats.max_tokens, 6);
        assert_eq!(stats.total_chars, 12);
    }

    #[test]
    fn test_empty() {
        assert_eq!(ChunkStats::from_chunks(&[]), ChunkStats::default());
    }
}
