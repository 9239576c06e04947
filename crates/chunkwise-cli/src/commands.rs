//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use chunkwise_core::{ChunkwiseConfig, Document};
use chunkwise_eval::EvaluationHarness;
use chunkwise_extract::AnthropicExtractor;
use chunkwise_infer::{create_embedder, EmbeddingAdapter};
use chunkwise_ingest::{count_tokens, ChunkStats, ChunkingStrategy, DocumentSource, TextFileSource};
use chunkwise_resolve::Retriever;
use chunkwise_store::{MemoryVectorStore, SqliteVectorStore, VectorIndex, VectorStore};

use crate::args::{DocumentArgs, EvaluateArgs, QueryArgs};
use crate::output::{self, ComparisonRow};

fn load_document(path: &Path) -> anyhow::Result<Document> {
    let document = TextFileSource
        .load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    info!(
        "Loaded {} ({} chars, {} pages)",
        document.source,
        document.text().len(),
        document.page_count()
    );
    Ok(document)
}

fn selected_strategies(
    config: &ChunkwiseConfig,
    args: &DocumentArgs,
) -> anyhow::Result<Vec<ChunkingStrategy>> {
    match &args.strategies {
        Some(kinds) => Ok(kinds
            .iter()
            .map(|k| ChunkingStrategy::from_kind(k, &config.chunking))
            .collect::<chunkwise_core::Result<Vec<_>>>()?),
        None => Ok(ChunkingStrategy::all(&config.chunking)),
    }
}

fn embedder(config: &ChunkwiseConfig) -> EmbeddingAdapter {
    EmbeddingAdapter::new(create_embedder(&config.embedding), config.embedding.batch_size)
}

fn open_store(config: &ChunkwiseConfig) -> anyhow::Result<Arc<dyn VectorStore>> {
    let store = SqliteVectorStore::open(&config.data_paths.vectordb)
        .map_err(|e| anyhow::anyhow!("Failed to open vector store: {}", e))?;
    Ok(Arc::new(store))
}

/// Chunk the document with every strategy and print size statistics.
pub fn compare(config: &ChunkwiseConfig, args: &DocumentArgs) -> anyhow::Result<()> {
    let document = load_document(&args.document)?;
    let mut rows = Vec::new();
    for strategy in selected_strategies(config, args)? {
        let set = strategy.chunk(&document)?;
        rows.push(ComparisonRow {
            strategy: strategy.name(),
            stats: ChunkStats::from_chunks(&set.chunks),
            parents: set.parents.len(),
        });
    }
    print!(
        "{}",
        output::render_comparison(&document, count_tokens(document.text()), &rows)
    );
    Ok(())
}

/// Build persistent per-strategy indexes for a document.
pub fn build(config: &ChunkwiseConfig, args: &DocumentArgs) -> anyhow::Result<()> {
    let document = load_document(&args.document)?;
    let index = VectorIndex::new(open_store(config)?);
    let embedder = embedder(config);

    for strategy in selected_strategies(config, args)? {
        let set = strategy.chunk(&document)?;
        let texts: Vec<&str> = set.chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = embedder.embed(&texts)?;
        let handle = index.build(&strategy.name(), strategy.kind(), &set, &vectors)?;
        println!(
            "{:<26} {:>6} chunks  {:>5} parents  dim={}",
            handle.namespace,
            handle.chunk_count,
            handle.parent_count(),
            handle.dimension
        );
    }
    Ok(())
}

/// Retrieve from an index built by `build`.
pub fn query(config: &ChunkwiseConfig, args: &QueryArgs) -> anyhow::Result<()> {
    let document = load_document(&args.document)?;
    let strategy = ChunkingStrategy::from_kind(&args.strategy, &config.chunking)?;
    let question = args.question();
    if question.trim().is_empty() {
        anyhow::bail!("missing <question>");
    }

    let index = VectorIndex::new(open_store(config)?);
    let embedder = embedder(config);
    let set = strategy.chunk(&document)?;
    let handle = index
        .attach(&strategy.name(), strategy.kind(), &set, embedder.dimension())
        .with_context(|| format!("Run `chunkwise build` for {} first", strategy.name()))?;

    let results = Retriever::new(&index, &embedder)
        .expand_to_parent(config.retrieval.expand_to_parent)
        .retrieve(&handle, &question, config.retrieval.top_k)?;
    print!(
        "{}",
        output::render_results(&document, &handle.namespace, &question, &results)
    );
    Ok(())
}

/// Run the evaluation harness and write the summary artifact.
pub fn evaluate(config: &ChunkwiseConfig, args: &EvaluateArgs) -> anyhow::Result<()> {
    let document = load_document(&args.input.document)?;
    let strategies = selected_strategies(config, &args.input)?;

    let extractor = AnthropicExtractor::new(config.extraction.clone())?;
    let store: Arc<dyn VectorStore> = if args.persist {
        open_store(config)?
    } else {
        Arc::new(MemoryVectorStore::new())
    };
    let index = VectorIndex::new(store);
    let embedder = embedder(config);

    let report = EvaluationHarness::new(&index, &embedder, &extractor)
        .with_pricing(config.pricing)
        .with_retrieval(config.retrieval.clone())
        .with_mode(args.mode)
        .run(&document, &strategies);

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| config.data_paths.results.join(report.default_file_name()));
    report.write_json(&path)?;

    print!("{}", output::render_report(&report));
    println!();
    println!("Summary written to {}", path.display());
    Ok(())
}
