//! Evaluation records, per-strategy runs and flat summaries.

use serde::{Deserialize, Serialize};

use chunkwise_core::{Error, PricingConfig, Result};

/// A question asked of each strategy, labelled with the field it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldQuery {
    pub field: String,
    pub question: String,
}

impl FieldQuery {
    pub fn new(field: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            question: question.into(),
        }
    }
}

/// Credit-agreement battery: one question per field category.
pub fn default_battery() -> Vec<FieldQuery> {
    vec![
        FieldQuery::new(
            "borrower",
            "Who is the borrower and what is their legal entity type?",
        ),
        FieldQuery::new("lender", "Who is the lender and what is their role?"),
        FieldQuery::new(
            "loan_details",
            "What is the total loan amount and facility type?",
        ),
        FieldQuery::new(
            "interest_terms",
            "What are the interest rate terms and payment frequency?",
        ),
        FieldQuery::new("maturity", "What is the maturity date and loan term?"),
        FieldQuery::new("financial_covenants", "What are the key financial covenants?"),
        FieldQuery::new("collateral", "What collateral secures the loan?"),
    ]
}

/// How queries are turned into extraction calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// One retrieval and one extraction per field.
    #[default]
    PerField,
    /// Multi-query retrieval and a single extraction for all fields.
    Combined,
}

impl EvaluationMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "per_field" | "perfield" => Ok(Self::PerField),
            "combined" => Ok(Self::Combined),
            other => Err(Error::Config(format!("unknown evaluation mode '{}'", other))),
        }
    }
}

impl std::fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerField => write!(f, "per_field"),
            Self::Combined => write!(f, "combined"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every query ran.
    Complete,
    /// An external call failed part-way; records cover the queries that ran.
    Incomplete,
    /// Chunking, embedding or indexing failed before any query ran.
    Failed,
}

/// One extraction call and what came back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub strategy: String,
    /// Field name in per-field mode, `combined` otherwise.
    pub query: String,
    pub fields: Vec<String>,
    pub retrieved_chunk_ids: Vec<String>,
    pub context_tokens: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub cost: f64,
    pub extracted_fields: Vec<String>,
    pub missing_fields: Vec<String>,
}

/// Everything measured for one strategy (or the baseline).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyRun {
    pub strategy: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub chunk_count: usize,
    pub total_chunk_tokens: usize,
    pub records: Vec<EvaluationRecord>,
}

impl StrategyRun {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            status: RunStatus::Complete,
            error: None,
            chunk_count: 0,
            total_chunk_tokens: 0,
            records: Vec::new(),
        }
    }

    pub(crate) fn fail(mut self, status: RunStatus, error: &Error) -> Self {
        self.status = status;
        self.error = Some(error.to_string());
        self
    }

    pub fn input_tokens(&self) -> usize {
        self.records.iter().map(|r| r.input_tokens).sum()
    }

    pub fn output_tokens(&self) -> usize {
        self.records.iter().map(|r| r.output_tokens).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.records.iter().map(|r| r.cost).sum()
    }

    /// Distinct chunks used across all queries.
    pub fn retrieved_chunk_count(&self) -> usize {
        let mut ids: Vec<&str> = self
            .records
            .iter()
            .flat_map(|r| r.retrieved_chunk_ids.iter().map(|s| s.as_str()))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    pub fn field_defects(&self) -> usize {
        self.records.iter().map(|r| r.missing_fields.len()).sum()
    }

    /// Recompute every record's cost under different rates.
    pub fn reprice(&mut self, pricing: &PricingConfig) {
        for r in &mut self.records {
            r.cost = pricing.cost(r.input_tokens, r.output_tokens);
        }
    }
}

/// Flat, field-name keyed summary persisted per strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub chunk_count: usize,
    pub total_chunk_tokens: usize,
    pub retrieved_chunk_count: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_cost: f64,
    /// Percent saved against the baseline; absent when not comparable.
    pub savings_pct: Option<f64>,
    pub field_defects: usize,
}
