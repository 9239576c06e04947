//! Feature-hashing embedder.
//!
//! Lowercased words (stop-words removed) and adjacent word pairs are hashed
//! with FNV-1a into `dimension` signed buckets, then L2-normalised. Texts that
//! share vocabulary land close in cosine space, which is enough to rank
//! chunks against short field questions without a model download.

use std::collections::HashSet;

use chunkwise_core::Result;
use ndarray::Array1;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::embedder::EmbeddingService;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("word regex is valid"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in",
        "is", "it", "its", "of", "on", "or", "that", "the", "this", "to", "was", "were",
        "what", "which", "who", "will", "with", "shall", "such", "any", "each", "all",
    ]
    .into_iter()
    .collect()
});

const BIGRAM_WEIGHT: f32 = 0.5;

pub struct HashingEmbedder {
    dimension: usize,
    name: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            name: format!("hashing-fnv1a-{}", dimension),
        }
    }

    pub fn embed_one(&self, text: &str) -> Array1<f32> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = WORD_RE
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|w| !STOP_WORDS.contains(w))
            .collect();

        let mut v = Array1::<f32>::zeros(self.dimension);
        for w in &words {
            self.add_feature(&mut v, w.as_bytes(), 1.0);
        }
        for pair in words.windows(2) {
            let feature = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut v, feature.as_bytes(), BIGRAM_WEIGHT);
        }

        let norm = v.dot(&v).sqrt();
        if norm > 0.0 {
            v /= norm;
        }
        v
    }

    fn add_feature(&self, v: &mut Array1<f32>, feature: &[u8], weight: f32) {
        let h = fnv1a(feature);
        let bucket = (h % self.dimension as u64) as usize;
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        v[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingService for HashingEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
