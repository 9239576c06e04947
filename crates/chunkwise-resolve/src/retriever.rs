//! Retriever over per-strategy indexes.

use std::collections::HashSet;

use chunkwise_core::{Error, Result};
use chunkwise_infer::EmbeddingAdapter;
use chunkwise_store::{StoreHit, StrategyIndex, VectorIndex};
use tracing::debug;

use crate::types::RetrievedChunk;

pub struct Retriever<'a> {
    index: &'a VectorIndex,
    embedder: &'a EmbeddingAdapter,
    expand_to_parent: bool,
}

impl<'a> Retriever<'a> {
    pub fn new(index: &'a VectorIndex, embedder: &'a EmbeddingAdapter) -> Self {
        Self {
            index,
            embedder,
            expand_to_parent: true,
        }
    }

    pub fn expand_to_parent(mut self, expand: bool) -> Self {
        self.expand_to_parent = expand;
        self
    }

    /// Top-`k` chunks for one query, ranked by similarity.
    ///
    /// On hierarchical indexes each child is replaced by its parent; when two
    /// children share a parent only the higher-ranked one is kept, so fewer
    /// than `k` results may come back.
    pub fn retrieve(
        &self,
        strategy_index: &StrategyIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let vector = self.embedder.embed_query(query)?;
        let hits = self.index.query(strategy_index, &vector, k)?;

        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let item = self.resolve_hit(strategy_index, hit)?;
            if seen.insert(item.id.clone()) {
                results.push(item);
            }
        }

        debug!(
            "{}: '{}' -> {} chunks",
            strategy_index.namespace,
            query,
            results.len()
        );
        Ok(results)
    }

    /// Union of per-query results, deduplicated by id and ordered by
    /// position in the document.
    pub fn retrieve_multi_query(
        &self,
        strategy_index: &StrategyIndex,
        queries: &[&str],
        k_per_query: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for query in queries {
            for item in self.retrieve(strategy_index, query, k_per_query)? {
                if seen.insert(item.id.clone()) {
                    results.push(item);
                }
            }
        }
        results.sort_by(|a, b| {
            a.source_span
                .start
                .cmp(&b.source_span.start)
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!(
            "{}: {} queries -> {} unique chunks",
            strategy_index.namespace,
            queries.len(),
            results.len()
        );
        Ok(results)
    }

    /// A child whose parent is missing from the index is an error, never a
    /// silent fallback to the unexpanded child.
    fn resolve_hit(&self, strategy_index: &StrategyIndex, hit: StoreHit) -> Result<RetrievedChunk> {
        let chunk = hit.chunk;
        if self.expand_to_parent && strategy_index.is_hierarchical() {
            if let Some(pid) = chunk.parent_id.as_deref() {
                let parent = strategy_index.parent(pid).ok_or_else(|| {
                    Error::NotFound(format!(
                        "{}: parent {} of {}",
                        strategy_index.namespace, pid, chunk.id
                    ))
                })?;
                return Ok(RetrievedChunk {
                    id: parent.id.clone(),
                    text: parent.text.clone(),
                    token_count: parent.token_count,
                    position: parent.position,
                    source_span: parent.source_span,
                    score: hit.score,
                    matched_child: Some(chunk.id),
                });
            }
        }
        Ok(RetrievedChunk {
            id: chunk.id,
            text: chunk.text,
            token_count: chunk.token_count,
            position: chunk.position,
            source_span: chunk.source_span,
            score: hit.score,
            matched_child: None,
        })
    }
}

/// Join chunks into one context block: `[Chunk 1]\n<text>`, blank-line separated.
pub fn combine_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[Chunk {}]\n{}", i + 1, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chunkwise_core::{Document, HierarchicalParams, SemanticParams, SourceSpan};
    use chunkwise_infer::HashingEmbedder;
    use chunkwise_ingest::ChunkingStrategy;
    use chunkwise_store::MemoryVectorStore;

    const SECTIONS: &[&str] = &[
        "The Borrower is TALF LLC, a Delaware limited liability company formed for this facility.",
        "The Lender is the Federal Reserve Bank of New York acting through its credit desk.",
        "Interest accrues at the Primary Credit Rate plus a margin of fifty basis points per annum.",
        "The Maturity Date of each Loan is the fifth anniversary of its Closing Date.",
        "Collateral consists of eligible asset-backed securities pledged to the Lender.",
        "The Borrower shall maintain a minimum net worth covenant tested at each quarter end.",
    ];

    fn document(repeats: usize) -> Document {
        let mut paragraphs = Vec::new();
        for r in 0..repeats {
            for s in SECTIONS {
                paragraphs.push(format!("Section {}. {}", r, s));
            }
        }
        Document::from_text("agreement.txt", paragraphs.join("\n\n"))
    }

    struct Fixture {
        index: VectorIndex,
        embedder: EmbeddingAdapter,
    }

    fn fixture() -> Fixture {
        Fixture {
            index: VectorIndex::new(Arc::new(MemoryVectorStore::new())),
            embedder: EmbeddingAdapter::new(Arc::new(HashingEmbedder::default()), 32),
        }
    }

    fn build(f: &Fixture, strategy: ChunkingStrategy, doc: &Document) -> StrategyIndex {
        let set = strategy.chunk(doc).unwrap();
        let texts: Vec<&str> = set.chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = f.embedder.embed(&texts).unwrap();
        f.index
            .build(&strategy.name(), strategy.kind(), &set, &vectors)
            .unwrap()
    }

    fn small_semantic() -> ChunkingStrategy {
        ChunkingStrategy::Semantic(SemanticParams {
            min_tokens: 10,
            target_tokens: 20,
            max_tokens: 40,
        })
    }

    #[test]
    fn test_retrieve_ranks_relevant_chunk_first() {
        let f = fixture();
        let doc = document(1);
        let handle = build(&f, small_semantic(), &doc);

        let results = Retriever::new(&f.index, &f.embedder)
            .retrieve(&handle, "Who is the lender? Federal Reserve Bank", 3)
            .unwrap();
        assert!(!results.is_empty());
        assert!(results[0].text.contains("Federal Reserve Bank"));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_retrieve_is_deterministic() {
        let f = fixture();
        let doc = document(3);
        let handle = build(&f, small_semantic(), &doc);
        let retriever = Retriever::new(&f.index, &f.embedder);
        let a = retriever.retrieve(&handle, "maturity date of the loan", 4).unwrap();
        let b = retriever.retrieve(&handle, "maturity date of the loan", 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_hierarchical_expands_and_dedups_parents() {
        let f = fixture();
        let doc = document(4);
        let strategy = ChunkingStrategy::Hierarchical(HierarchicalParams {
            parent_tokens: 120,
            child_tokens: 30,
        });
        let handle = build(&f, strategy, &doc);

        let results = Retriever::new(&f.index, &f.embedder)
            .retrieve(&handle, "collateral asset-backed securities pledged", 8)
            .unwrap();
        let ids: HashSet<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), results.len());
        for r in &results {
            assert!(r.is_expanded());
            assert!(r.id.contains(":parent:"));
            let parent = handle.parent(&r.id).unwrap();
            assert_eq!(r.text, parent.text);
            assert!(parent.child_ids.contains(r.matched_child.as_ref().unwrap()));
        }

        let raw = Retriever::new(&f.index, &f.embedder)
            .expand_to_parent(false)
            .retrieve(&handle, "collateral asset-backed securities pledged", 8)
            .unwrap();
        assert_eq!(raw.len(), 8);
        assert!(raw.iter().all(|r| !r.is_expanded()));
    }

    #[test]
    fn test_missing_parent_is_not_found() {
        let f = fixture();
        let doc = document(2);
        let strategy = ChunkingStrategy::Hierarchical(HierarchicalParams {
            parent_tokens: 120,
            child_tokens: 30,
        });
        let mut set = strategy.chunk(&doc).unwrap();
        assert!(set.chunks.iter().all(|c| c.parent_id.is_some()));
        set.parents.clear();
        let texts: Vec<&str> = set.chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = f.embedder.embed(&texts).unwrap();
        let handle = f
            .index
            .build(&strategy.name(), strategy.kind(), &set, &vectors)
            .unwrap();

        let err = Retriever::new(&f.index, &f.embedder)
            .retrieve(&handle, "Who is the lender?", 3)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let raw = Retriever::new(&f.index, &f.embedder)
            .expand_to_parent(false)
            .retrieve(&handle, "Who is the lender?", 3)
            .unwrap();
        assert_eq!(raw.len(), 3);
    }

    #[test]
    fn test_multi_query_union_in_document_order() {
        let f = fixture();
        let doc = document(2);
        let handle = build(&f, small_semantic(), &doc);
        let retriever = Retriever::new(&f.index, &f.embedder);

        let queries = ["Who is the borrower?", "Who is the lender?", "Who is the borrower?"];
        let results = retriever.retrieve_multi_query(&handle, &queries, 2).unwrap();

        let ids: HashSet<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), results.len());
        assert!(results.len() <= 4);
        assert!(results
            .windows(2)
            .all(|w| w[0].source_span.start <= w[1].source_span.start));
    }

    #[test]
    fn test_combine_context_format() {
        let chunk = |id: &str, text: &str| RetrievedChunk {
            id: id.into(),
            text: text.into(),
            token_count: 1,
            position: 0,
            source_span: SourceSpan::new(0, 0),
            score: 0.0,
            matched_child: None,
        };
        let context = combine_context(&[chunk("a", "First."), chunk("b", "Second.")]);
        assert_eq!(context, "[Chunk 1]\nFirst.\n\n[Chunk 2]\nSecond.");
        assert_eq!(combine_context(&[]), "");
    }
}
