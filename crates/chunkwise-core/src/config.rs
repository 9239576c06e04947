//! Configuration: data directories, chunking parameters, embedding, retrieval,
//! pricing and extraction settings.
//!
//! Values come from defaults, an optional JSON file, and `CHUNKWISE_*`
//! environment variables (environment wins).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Paths to the Chunkwise data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Persistent vector store directory (`data/vectordb/`).
    pub vectordb: PathBuf,
    /// Evaluation report output (`data/results/`).
    pub results: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let paths = Self::unchecked(root);
        paths.ensure_dirs()?;
        Ok(paths)
    }

    /// Data paths under `root` without touching the filesystem.
    pub fn unchecked(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            vectordb: root.join("vectordb"),
            results: root.join("results"),
            root,
        }
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.vectordb)?;
        std::fs::create_dir_all(&self.results)?;
        Ok(())
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::unchecked("data")
    }
}

/// Fixed-window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedParams {
    pub target_tokens: usize,
    /// Fraction of `target_tokens` repeated at the start of the next window.
    pub overlap_fraction: f64,
}

impl Default for FixedParams {
    fn default() -> Self {
        Self {
            target_tokens: 300,
            overlap_fraction: 0.20,
        }
    }
}

impl FixedParams {
    /// Overlap in tokens: `round(target_tokens * overlap_fraction)`.
    pub fn overlap_tokens(&self) -> usize {
        (self.target_tokens as f64 * self.overlap_fraction).round() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_tokens == 0 {
            return Err(Error::InvalidParameters("target_tokens must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.overlap_fraction) {
            return Err(Error::InvalidParameters(format!(
                "overlap_fraction must be in [0, 1), got {}",
                self.overlap_fraction
            )));
        }
        if self.overlap_tokens() >= self.target_tokens {
            return Err(Error::InvalidParameters(format!(
                "overlap of {} tokens leaves no progress for a {}-token window",
                self.overlap_tokens(),
                self.target_tokens
            )));
        }
        Ok(())
    }
}

/// Sentence-accumulating parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticParams {
    pub min_tokens: usize,
    pub target_tokens: usize,
    pub max_tokens: usize,
}

impl Default for SemanticParams {
    fn default() -> Self {
        Self {
            min_tokens: 200,
            target_tokens: 300,
            max_tokens: 500,
        }
    }
}

impl SemanticParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(Error::InvalidParameters("max_tokens must be > 0".into()));
        }
        if self.min_tokens > self.max_tokens {
            return Err(Error::InvalidParameters(format!(
                "min_tokens ({}) exceeds max_tokens ({})",
                self.min_tokens, self.max_tokens
            )));
        }
        if self.target_tokens < self.min_tokens || self.target_tokens > self.max_tokens {
            return Err(Error::InvalidParameters(format!(
                "target_tokens ({}) must lie within [{}, {}]",
                self.target_tokens, self.min_tokens, self.max_tokens
            )));
        }
        Ok(())
    }
}

/// Parent/child window sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchicalParams {
    pub parent_tokens: usize,
    pub child_tokens: usize,
}

impl Default for HierarchicalParams {
    fn default() -> Self {
        Self {
            parent_tokens: 1000,
            child_tokens: 300,
        }
    }
}

impl HierarchicalParams {
    pub fn validate(&self) -> Result<()> {
        if self.parent_tokens == 0 || self.child_tokens == 0 {
            return Err(Error::InvalidParameters(
                "parent_tokens and child_tokens must be > 0".into(),
            ));
        }
        if self.child_tokens > self.parent_tokens {
            return Err(Error::InvalidParameters(format!(
                "child_tokens ({}) exceeds parent_tokens ({})",
                self.child_tokens, self.parent_tokens
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub fixed: FixedParams,
    pub semantic: SemanticParams,
    pub hierarchical: HierarchicalParams,
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        self.fixed.validate()?;
        self.semantic.validate()?;
        self.hierarchical.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding dimension (384 for all-MiniLM-L6-v2 and the hashing embedder).
    pub dimension: usize,
    /// Texts per embedding call.
    pub batch_size: usize,
    /// Directory holding `model.onnx` + `tokenizer.json`.
    pub model_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            batch_size: 32,
            model_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Replace hierarchical children with their parent's text.
    pub expand_to_parent: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            expand_to_parent: true,
        }
    }
}

/// Per-token prices in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub input_rate: f64,
    pub output_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        // Claude Sonnet: $3 / $15 per million tokens
        Self {
            input_rate: 0.000_003,
            output_rate: 0.000_015,
        }
    }
}

impl PricingConfig {
    pub fn cost(&self, input_tokens: usize, output_tokens: usize) -> f64 {
        input_tokens as f64 * self.input_rate + output_tokens as f64 * self.output_rate
    }
}

pub const DEFAULT_EXTRACTION_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub model: String,
    pub base_url: String,
    pub max_tokens: usize,
    pub timeout_secs: u64,
    /// Context longer than this is truncated before the call (~100k tokens).
    pub max_context_chars: usize,
    /// Never written back to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_EXTRACTION_MODEL.into(),
            base_url: DEFAULT_ANTHROPIC_BASE_URL.into(),
            max_tokens: 4096,
            timeout_secs: 120,
            max_context_chars: 400_000,
            api_key: None,
        }
    }
}

/// Top-level Chunkwise configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkwiseConfig {
    #[serde(skip)]
    pub data_paths: DataPaths,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub pricing: PricingConfig,
    pub extraction: ExtractionConfig,
}

impl ChunkwiseConfig {
    /// Defaults plus environment overrides, rooted at `data_dir`.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self {
            data_paths: DataPaths::new(data_dir)?,
            ..Default::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file (missing keys keep defaults), then apply the environment.
    pub fn load(path: impl AsRef<Path>, data_dir: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let mut config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.data_paths = DataPaths::new(data_dir)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.embedding.batch_size == 0 {
            return Err(Error::Config("embedding.batch_size must be > 0".into()));
        }
        if self.embedding.dimension == 0 {
            return Err(Error::Config("embedding.dimension must be > 0".into()));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be > 0".into()));
        }
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        fn parsed<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
            var(key).and_then(|v| v.trim().parse().ok())
        }

        if let Some(k) = parsed(&var, "CHUNKWISE_TOP_K") {
            self.retrieval.top_k = k;
        }
        if let Some(b) = parsed(&var, "CHUNKWISE_EMBED_BATCH") {
            self.embedding.batch_size = b;
        }
        if let Some(d) = parsed(&var, "CHUNKWISE_EMBED_DIM") {
            self.embedding.dimension = d;
        }
        if let Some(dir) = var("CHUNKWISE_MODEL_DIR") {
            self.embedding.model_dir = Some(PathBuf::from(dir));
        }
        if let Some(r) = parsed(&var, "CHUNKWISE_INPUT_RATE") {
            self.pricing.input_rate = r;
        }
        if let Some(r) = parsed(&var, "CHUNKWISE_OUTPUT_RATE") {
            self.pricing.output_rate = r;
        }
        if let Some(model) = var("CHUNKWISE_EXTRACT_MODEL") {
            self.extraction.model = model;
        }
        if let Some(key) = var("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.extraction.api_key = Some(key);
        }
    }
}
