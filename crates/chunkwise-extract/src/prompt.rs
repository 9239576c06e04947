//! Prompt construction and response parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::types::FieldSchema;

static JSON_OBJECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("json object regex is valid"));

/// Extraction prompt asking for the schema's fields as JSON.
pub fn build_prompt(context: &str, schema: &FieldSchema) -> String {
    let fields: Vec<String> = schema
        .fields
        .iter()
        .map(|f| format!("- {}: {}", f.key, f.shape))
        .collect();

    format!(
        "Extract credit agreement terms from the following document chunks and return as JSON.\n\n\
         Extract these fields:\n{}\n\n\
         Document chunks:\n\n{}\n\n\
         Return ONLY valid JSON with the extracted information. If a field is not found, use null.\n",
        fields.join("\n"),
        context
    )
}

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Pull the outermost `{...}` object out of a model response.
///
/// Responses without a parseable object become `{"error", "raw_response"}`
/// so every requested field reads as missing.
pub fn parse_json_response(text: &str) -> serde_json::Value {
    match JSON_OBJECT_RE.find(text) {
        Some(m) => match serde_json::from_str::<serde_json::Value>(m.as_str()) {
            Ok(value) => value,
            Err(_) => json!({"error": "Failed to parse JSON", "raw_response": text}),
        },
        None => json!({"error": "No JSON found in response", "raw_response": text}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_fields_and_context() {
        let schema = FieldSchema::credit_agreement().select(&["borrower", "maturity"]);
        let prompt = build_prompt("[Chunk 1]\nThe borrower is TALF LLC.", &schema);
        assert!(prompt.contains("- borrower: {name, entity_type, jurisdiction}"));
        assert!(prompt.contains("- maturity: {effective_date, maturity_date, term}"));
        assert!(!prompt.contains("- lender"));
        assert!(prompt.contains("Document chunks:\n\n[Chunk 1]\nThe borrower is TALF LLC."));
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = "Here you go:\n```json\n{\"borrower\": {\"name\": \"TALF LLC\"}, \"fees\": null}\n```";
        let value = parse_json_response(text);
        assert_eq!(value["borrower"]["name"], "TALF LLC");
        assert!(value["fees"].is_null());
    }

    #[test]
    fn test_parse_failures_become_error_objects() {
        let value = parse_json_response("I could not find anything.");
        assert_eq!(value["error"], "No JSON found in response");

        let value = parse_json_response("{borrower: TALF}");
        assert_eq!(value["error"], "Failed to parse JSON");
        assert_eq!(value["raw_response"], "{borrower: TALF}");
    }

    #[test]
    fn test_truncate_chars_on_boundary() {
        assert_eq!(truncate_chars("échéance", 3), "éch");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
