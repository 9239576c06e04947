//! Evaluation harness execution.
//!
//! Each strategy runs chunk → embed → index → retrieve → extract in sequence.
//! A baseline runs the same field battery against the full document.

use chunkwise_core::{Document, PricingConfig, Result, RetrievalConfig, StrategyKind};
use chunkwise_extract::{ExtractionService, FieldSchema};
use chunkwise_infer::EmbeddingAdapter;
use chunkwise_ingest::{count_tokens, ChunkStats, ChunkingStrategy};
use chunkwise_resolve::{combine_context, Retriever};
use chunkwise_store::{StrategyIndex, VectorIndex};
use tracing::{debug, info, warn};

use crate::completeness::check_fields;
use crate::report::EvaluationReport;
use crate::types::*;

pub const BASELINE: &str = "baseline";
const COMBINED_LABEL: &str = "combined";

/// Chunk ids plus the text handed to the extractor.
struct Context {
    chunk_ids: Vec<String>,
    text: String,
}

pub struct EvaluationHarness<'a> {
    index: &'a VectorIndex,
    embedder: &'a EmbeddingAdapter,
    extractor: &'a dyn ExtractionService,
    schema: FieldSchema,
    battery: Vec<FieldQuery>,
    pricing: PricingConfig,
    retrieval: RetrievalConfig,
    mode: EvaluationMode,
}

impl<'a> EvaluationHarness<'a> {
    pub fn new(
        index: &'a VectorIndex,
        embedder: &'a EmbeddingAdapter,
        extractor: &'a dyn ExtractionService,
    ) -> Self {
        Self {
            index,
            embedder,
            extractor,
            schema: FieldSchema::credit_agreement(),
            battery: default_battery(),
            pricing: PricingConfig::default(),
            retrieval: RetrievalConfig::default(),
            mode: EvaluationMode::default(),
        }
    }

    pub fn with_battery(mut self, battery: Vec<FieldQuery>) -> Self {
        self.battery = battery;
        self
    }

    pub fn with_schema(mut self, schema: FieldSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingConfig) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn battery(&self) -> &[FieldQuery] {
        &self.battery
    }

    /// Run the baseline and every strategy against one document.
    ///
    /// Never fails as a whole: errors are recorded on the affected run.
    pub fn run(&self, document: &Document, strategies: &[ChunkingStrategy]) -> EvaluationReport {
        let start = std::time::Instant::now();
        info!(
            "Starting evaluation of {} ({} strategies, {} fields, mode={})",
            document.source,
            strategies.len(),
            self.battery.len(),
            self.mode
        );

        let baseline = self.run_baseline(document);
        let strategies: Vec<StrategyRun> = strategies
            .iter()
            .map(|s| self.run_strategy(document, s))
            .collect();

        let report = EvaluationReport::new(
            document,
            self.mode,
            self.extractor.model_name(),
            baseline,
            strategies,
        );
        info!(
            "Evaluation complete: {} runs, duration={}ms",
            report.strategies.len() + 1,
            start.elapsed().as_millis()
        );
        report
    }

    /// Every field against the full document text.
    pub fn run_baseline(&self, document: &Document) -> StrategyRun {
        let mut run = StrategyRun::new(BASELINE);
        run.chunk_count = 1;
        run.total_chunk_tokens = count_tokens(document.text());

        let result = self.extract_battery(&mut run, |_| {
            Ok(Context {
                chunk_ids: vec![document.id.clone()],
                text: document.text().to_string(),
            })
        });
        self.finish(run, result)
    }

    /// One strategy end to end.
    pub fn run_strategy(&self, document: &Document, strategy: &ChunkingStrategy) -> StrategyRun {
        let mut run = StrategyRun::new(strategy.name());
        info!("Evaluating strategy {}", run.strategy);

        let handle = match self.prepare(document, strategy, &mut run) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Strategy {} failed: {}", run.strategy, e);
                return run.fail(RunStatus::Failed, &e);
            }
        };

        let retriever = Retriever::new(self.index, self.embedder)
            .expand_to_parent(self.retrieval.expand_to_parent);
        let k = self.retrieval.top_k;
        let mode = self.mode;
        let result = self.extract_battery(&mut run, |queries| {
            let chunks = match mode {
                EvaluationMode::PerField => {
                    let mut all = Vec::new();
                    for q in queries {
                        all.extend(retriever.retrieve(&handle, &q.question, k)?);
                    }
                    all
                }
                EvaluationMode::Combined => {
                    let questions: Vec<&str> =
                        queries.iter().map(|q| q.question.as_str()).collect();
                    retriever.retrieve_multi_query(&handle, &questions, k)?
                }
            };
            Ok(Context {
                chunk_ids: chunks.iter().map(|c| c.id.clone()).collect(),
                text: combine_context(&chunks),
            })
        });
        self.finish(run, result)
    }

    fn prepare(
        &self,
        document: &Document,
        strategy: &ChunkingStrategy,
        run: &mut StrategyRun,
    ) -> Result<StrategyIndex> {
        let set = strategy.chunk(document)?;
        let stats = ChunkStats::from_chunks(&set.chunks);
        run.chunk_count = stats.num_chunks;
        run.total_chunk_tokens = stats.total_tokens;
        if strategy.kind() == StrategyKind::SplitsHierarchically {
            debug!("{}: {} parents", run.strategy, set.parents.len());
        }

        let texts: Vec<&str> = set.chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = self.embedder.embed(&texts)?;
        self.index.build(&run.strategy, strategy.kind(), &set, &vectors)
    }

    /// Issue the extraction calls for the battery, one per field or one in total.
    fn extract_battery<F>(&self, run: &mut StrategyRun, mut context_for: F) -> Result<()>
    where
        F: FnMut(&[&FieldQuery]) -> Result<Context>,
    {
        match self.mode {
            EvaluationMode::PerField => {
                for query in &self.battery {
                    let context = context_for(&[query])?;
                    let record =
                        self.extract_record(&run.strategy, &query.field, &[query], context)?;
                    run.records.push(record);
                }
            }
            EvaluationMode::Combined => {
                let queries: Vec<&FieldQuery> = self.battery.iter().collect();
                let context = context_for(&queries)?;
                let record =
                    self.extract_record(&run.strategy, COMBINED_LABEL, &queries, context)?;
                run.records.push(record);
            }
        }
        Ok(())
    }

    fn extract_record(
        &self,
        strategy: &str,
        label: &str,
        queries: &[&FieldQuery],
        context: Context,
    ) -> Result<EvaluationRecord> {
        let fields: Vec<String> = queries.iter().map(|q| q.field.clone()).collect();
        let schema = self.schema.select(&fields);
        let output = self.extractor.extract(&context.text, &schema)?;
        let (extracted_fields, missing_fields) = check_fields(&output.json, &fields);

        debug!(
            "{} [{}]: {} chunks, {} in / {} out tokens, {} missing",
            strategy,
            label,
            context.chunk_ids.len(),
            output.input_tokens,
            output.output_tokens,
            missing_fields.len()
        );

        Ok(EvaluationRecord {
            strategy: strategy.to_string(),
            query: label.to_string(),
            fields,
            retrieved_chunk_ids: context.chunk_ids,
            context_tokens: count_tokens(&context.text),
            input_tokens: output.input_tokens,
            output_tokens: output.output_tokens,
            cost: self.pricing.cost(output.input_tokens, output.output_tokens),
            extracted_fields,
            missing_fields,
        })
    }

    fn finish(&self, run: StrategyRun, result: Result<()>) -> StrategyRun {
        match result {
            Ok(()) => {
                info!(
                    "{}: {} calls, {} input tokens, ${:.4}, {} field defects",
                    run.strategy,
                    run.records.len(),
                    run.input_tokens(),
                    run.total_cost(),
                    run.field_defects()
                );
                run
            }
            Err(e) => {
                warn!(
                    "{} incomplete after {} calls: {}",
                    run.strategy,
                    run.records.len(),
                    e
                );
                run.fail(RunStatus::Incomplete, &e)
            }
        }
    }
}
