//! Chunkwise Extract — structured field extraction from retrieved context.
//!
//! `ExtractionService` is the seam the evaluation harness calls;
//! `AnthropicExtractor` implements it against the Messages API.

pub mod anthropic;
pub mod prompt;
pub mod types;

pub use anthropic::AnthropicExtractor;
pub use prompt::{build_prompt, parse_json_response};
pub use types::{ExtractionOutput, ExtractionService, FieldSchema, FieldSpec};
