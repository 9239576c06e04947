//! Extraction types.

use chunkwise_core::Result;
use serde::{Deserialize, Serialize};

/// One field the extractor is asked to fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// JSON key expected in the response.
    pub key: String,
    /// Shape hint shown to the model, e.g. `{name, entity_type, jurisdiction}`.
    pub shape: String,
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, shape: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            shape: shape.into(),
        }
    }
}

/// The set of fields requested in one extraction call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub fields: Vec<FieldSpec>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Credit-agreement terms.
    pub fn credit_agreement() -> Self {
        Self::new(vec![
            FieldSpec::new("borrower", "{name, entity_type, jurisdiction}"),
            FieldSpec::new("lender", "[{name, role, commitment}] (array if multiple)"),
            FieldSpec::new("loan_details", "{total_amount, facility_type, purpose, currency}"),
            FieldSpec::new(
                "interest_terms",
                "{base_rate, margin, total_rate, payment_frequency}",
            ),
            FieldSpec::new("maturity", "{effective_date, maturity_date, term}"),
            FieldSpec::new("fees", "{origination_fee, commitment_fee}"),
            FieldSpec::new("financial_covenants", "[array of covenant descriptions]"),
            FieldSpec::new("collateral", "[array of collateral descriptions]"),
        ])
    }

    /// Subset of this schema with the given keys, in the given order.
    ///
    /// Keys unknown to the schema get a free-form shape.
    pub fn select<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        let fields = keys
            .iter()
            .map(|k| {
                let k = k.as_ref();
                self.get(k)
                    .cloned()
                    .unwrap_or_else(|| FieldSpec::new(k, "value"))
            })
            .collect();
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parsed result plus the token usage reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub json: serde_json::Value,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// Anything that turns context text into structured fields.
pub trait ExtractionService: Send + Sync {
    fn extract(&self, context: &str, schema: &FieldSchema) -> Result<ExtractionOutput>;

    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_preserves_order_and_shapes() {
        let schema = FieldSchema::credit_agreement();
        let picked = schema.select(&["maturity", "borrower", "governing_law"]);
        assert_eq!(picked.keys(), vec!["maturity", "borrower", "governing_law"]);
        assert_eq!(picked.fields[1].shape, "{name, entity_type, jurisdiction}");
        assert_eq!(picked.fields[2].shape, "value");
    }

    #[test]
    fn test_credit_agreement_keys() {
        let schema = FieldSchema::credit_agreement();
        assert_eq!(schema.len(), 8);
        assert!(schema.get("fees").is_some());
    }
}
