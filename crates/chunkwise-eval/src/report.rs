//! Evaluation report and the persisted summary artifact.

use std::path::Path;

use chrono::{DateTime, Utc};
use chunkwise_core::{Document, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub document_id: String,
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub mode: EvaluationMode,
    pub model: String,
    pub baseline: StrategyRun,
    pub strategies: Vec<StrategyRun>,
}

impl EvaluationReport {
    pub fn new(
        document: &Document,
        mode: EvaluationMode,
        model: &str,
        baseline: StrategyRun,
        strategies: Vec<StrategyRun>,
    ) -> Self {
        Self {
            document_id: document.id.clone(),
            source: document.source.clone(),
            generated_at: Utc::now(),
            mode,
            model: model.to_string(),
            baseline,
            strategies,
        }
    }

    /// Percent of the baseline cost a run saves.
    ///
    /// `None` unless both the run and the baseline completed and the
    /// baseline cost something.
    pub fn savings_pct(&self, run: &StrategyRun) -> Option<f64> {
        let baseline_cost = self.baseline.total_cost();
        if run.status != RunStatus::Complete
            || self.baseline.status != RunStatus::Complete
            || baseline_cost <= 0.0
        {
            return None;
        }
        Some((baseline_cost - run.total_cost()) / baseline_cost * 100.0)
    }

    fn summarize(&self, run: &StrategyRun, savings_pct: Option<f64>) -> StrategySummary {
        StrategySummary {
            strategy: run.strategy.clone(),
            status: run.status,
            error: run.error.clone(),
            chunk_count: run.chunk_count,
            total_chunk_tokens: run.total_chunk_tokens,
            retrieved_chunk_count: run.retrieved_chunk_count(),
            input_tokens: run.input_tokens(),
            output_tokens: run.output_tokens(),
            total_cost: run.total_cost(),
            savings_pct,
            field_defects: run.field_defects(),
        }
    }

    /// Flat records, baseline first.
    pub fn summaries(&self) -> Vec<StrategySummary> {
        std::iter::once(self.summarize(&self.baseline, None))
            .chain(
                self.strategies
                    .iter()
                    .map(|run| self.summarize(run, self.savings_pct(run))),
            )
            .collect()
    }

    /// Cheapest strategy that ran every query.
    pub fn best_strategy(&self) -> Option<&StrategyRun> {
        self.strategies
            .iter()
            .filter(|r| r.status == RunStatus::Complete)
            .min_by(|a, b| {
                a.total_cost()
                    .total_cmp(&b.total_cost())
                    .then_with(|| a.strategy.cmp(&b.strategy))
            })
    }

    /// `evaluation_<doc>_<timestamp>.json`
    pub fn default_file_name(&self) -> String {
        let short_id: String = self.document_id.chars().take(12).collect();
        format!(
            "evaluation_{}_{}.json",
            short_id,
            self.generated_at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write the summary array as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.summaries())?;
        std::fs::write(path, json)?;
        info!("Wrote evaluation summary to {}", path.display());
        Ok(())
    }

    /// Write the full report, records included.
    pub fn write_full_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
