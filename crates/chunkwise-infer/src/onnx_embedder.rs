//! ONNX-based embedding service using all-MiniLM-L6-v2.
//!
//! Loads a SentenceTransformers ONNX model and tokenizer to generate
//! 384-dimensional float32 embeddings. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use chunkwise_core::{Error, Result};
    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::info;

    use crate::embedder::EmbeddingService;

    /// Maximum sequence length for the model.
    const MAX_SEQ_LEN: usize = 512;

    const DIMENSION: usize = 384;

    const MODEL_NAME: &str = "all-MiniLM-L6-v2";

    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
    }

    fn onnx_err(context: &str, e: impl std::fmt::Display) -> Error {
        Error::EmbeddingService(format!("{}: {}", context, e))
    }

    impl OnnxEmbedder {
        /// Load `model_dir/model.onnx` and `model_dir/tokenizer.json`.
        ///
        /// With the load-dynamic feature, `ORT_DYLIB_PATH` must point to libonnxruntime.
        pub fn load(model_dir: &Path) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(Error::NotFound(format!("model {}", model_path.display())));
            }
            if !tokenizer_path.exists() {
                return Err(Error::NotFound(format!(
                    "tokenizer {}",
                    tokenizer_path.display()
                )));
            }

            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| onnx_err("session builder", e))?
                .with_intra_threads(2)
                .map_err(|e| onnx_err("intra threads", e))?
                .commit_from_file(&model_path)
                .map_err(|e| onnx_err("load model", e))?;

            let tokenizer =
                Tokenizer::from_file(&tokenizer_path).map_err(|e| onnx_err("load tokenizer", e))?;

            info!("ONNX embedder loaded from {}", model_path.display());

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
            })
        }

        fn infer(&self, text: &str) -> Result<Array1<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| onnx_err("tokenize", e))?;

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let input_ids = &encoding.get_ids()[..seq_len];
            let attention_mask = &encoding.get_attention_mask()[..seq_len];

            let ids: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
            let mask: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();
            let type_ids: Vec<i64> = vec![0; seq_len];

            let ids = Tensor::from_array(([1usize, seq_len], ids)).map_err(|e| onnx_err("ids", e))?;
            let mask_t =
                Tensor::from_array(([1usize, seq_len], mask)).map_err(|e| onnx_err("mask", e))?;
            let types = Tensor::from_array(([1usize, seq_len], type_ids))
                .map_err(|e| onnx_err("type ids", e))?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids, mask_t, types])
                .map_err(|e| onnx_err("inference", e))?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| onnx_err("output tensor", e))?;
            let dims: Vec<i64> = shape.iter().copied().collect();

            let pooled = match dims.as_slice() {
                // [1, seq_len, dim]: mean over attended tokens
                [_, _, dim] => {
                    let dim = *dim as usize;
                    let mask_sum: f32 = attention_mask.iter().map(|&m| m as f32).sum();
                    if mask_sum < 1e-9 {
                        return Err(Error::EmbeddingService("empty attention mask".into()));
                    }
                    let mut pooled = Array1::<f32>::zeros(dim);
                    for (i, &m) in attention_mask.iter().enumerate() {
                        if m > 0 {
                            let offset = i * dim;
                            for d in 0..dim {
                                pooled[d] += data[offset + d];
                            }
                        }
                    }
                    pooled / mask_sum
                }
                // [1, dim]: already pooled
                [_, dim] => Array1::from_vec(data[..*dim as usize].to_vec()),
                other => {
                    return Err(Error::EmbeddingService(format!(
                        "unexpected output shape {:?}",
                        other
                    )))
                }
            };

            let norm = pooled.dot(&pooled).sqrt();
            Ok(if norm > 0.0 { pooled / norm } else { pooled })
        }
    }

    impl EmbeddingService for OnnxEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Array1<f32>>> {
            texts.iter().map(|t| self.infer(t)).collect()
        }

        fn dimension(&self) -> usize {
            DIMENSION
        }

        fn model_name(&self) -> &str {
            MODEL_NAME
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
