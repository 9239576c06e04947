//! Anthropic Messages API extraction client.
//!
//! The harness is synchronous, so the client owns a current-thread Tokio
//! runtime and blocks on one request at a time.

use std::time::Duration;

use chunkwise_core::{Error, ExtractionConfig, Result};
use reqwest::Client;
use serde_json::json;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, warn};

use crate::prompt::{build_prompt, parse_json_response, truncate_chars};
use crate::types::{ExtractionOutput, ExtractionService, FieldSchema};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicExtractor {
    client: Client,
    runtime: Runtime,
    config: ExtractionConfig,
    api_key: String,
}

impl AnthropicExtractor {
    /// Build a client from configuration. Fails with `Config` when no API key is set.
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("ANTHROPIC_API_KEY not set".into()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        let runtime = Builder::new_current_thread().enable_all().build()?;

        info!("Anthropic extractor ready (model={})", config.model);
        Ok(Self {
            client,
            runtime,
            config,
            api_key,
        })
    }

    async fn send(&self, prompt: String) -> Result<ExtractionOutput> {
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": 0,
            "messages": [{"role": "user", "content": prompt}],
        });

        debug!("POST {} (model={})", url, self.config.model);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ExtractionService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ExtractionService(format!(
                "API error {}: {}",
                status, body
            )));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::ExtractionService(format!("Invalid response body: {}", e)))?;

        let text = parsed["content"][0]["text"].as_str().ok_or_else(|| {
            Error::ExtractionService("response has no text content".into())
        })?;
        let usage = |key: &str| {
            parsed["usage"][key]
                .as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| Error::ExtractionService(format!("response missing usage.{}", key)))
        };

        Ok(ExtractionOutput {
            json: parse_json_response(text),
            input_tokens: usage("input_tokens")?,
            output_tokens: usage("output_tokens")?,
        })
    }
}

impl ExtractionService for AnthropicExtractor {
    fn extract(&self, context: &str, schema: &FieldSchema) -> Result<ExtractionOutput> {
        let limit = self.config.max_context_chars;
        let truncated = truncate_chars(context, limit);
        if truncated.len() < context.len() {
            warn!("Context truncated to {} chars", limit);
        }
        let prompt = build_prompt(truncated, schema);
        let output = self.runtime.block_on(self.send(prompt))?;
        debug!(
            "Extraction: {} input / {} output tokens",
            output.input_tokens, output.output_tokens
        );
        Ok(output)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    /// Serve exactly one HTTP response and hand back the raw request.
    fn serve_once(status: &str, body: &str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + length {
                        break;
                    }
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            tx.send(String::from_utf8_lossy(&raw).to_string()).unwrap();
        });
        (format!("http://{}", addr), rx)
    }

    fn config(base_url: String) -> ExtractionConfig {
        ExtractionConfig {
            base_url,
            api_key: Some("test-key".into()),
            timeout_secs: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        let result = AnthropicExtractor::new(ExtractionConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_successful_extraction() {
        let body = r#"{"content":[{"type":"text","text":"{\"borrower\":{\"name\":\"TALF LLC\"}}"}],"usage":{"input_tokens":812,"output_tokens":64}}"#;
        let (url, rx) = serve_once("200 OK", body);
        let extractor = AnthropicExtractor::new(config(url)).unwrap();

        let schema = FieldSchema::credit_agreement().select(&["borrower"]);
        let out = extractor
            .extract("[Chunk 1]\nThe borrower is TALF LLC.", &schema)
            .unwrap();
        assert_eq!(out.input_tokens, 812);
        assert_eq!(out.output_tokens, 64);
        assert_eq!(out.json["borrower"]["name"], "TALF LLC");

        let request = rx.recv().unwrap();
        assert!(request.starts_with("POST /v1/messages"));
        assert!(request.to_ascii_lowercase().contains("x-api-key: test-key"));
        assert!(request.contains("2023-06-01"));
        assert!(request.contains("claude-sonnet-4-5-20250929"));
    }

    #[test]
    fn test_api_error_is_extraction_error() {
        let (url, _rx) = serve_once("429 Too Many Requests", r#"{"error":{"message":"slow down"}}"#);
        let extractor = AnthropicExtractor::new(config(url)).unwrap();
        let err = extractor
            .extract("context", &FieldSchema::credit_agreement())
            .unwrap_err();
        assert!(matches!(err, Error::ExtractionService(ref m) if m.contains("429")));
    }
}
