//! Chunkwise Eval — compares chunking strategies on extraction cost and
//! field completeness against a full-document baseline.

pub mod completeness;
pub mod harness;
pub mod report;
pub mod types;

pub use completeness::{check_fields, is_present};
pub use harness::{EvaluationHarness, BASELINE};
pub use report::EvaluationReport;
pub use types::{
    default_battery, EvaluationMode, EvaluationRecord, FieldQuery, RunStatus, StrategyRun,
    StrategySummary,
};
