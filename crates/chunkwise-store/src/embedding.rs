//! uint8 quantization for persisted embeddings.

use ndarray::Array1;

/// A quantized vector: `value ≈ byte * scale + offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantized {
    pub bytes: Vec<u8>,
    pub scale: f32,
    pub offset: f32,
}

/// Map `[min, max]` of the vector linearly onto `[0, 255]`.
pub fn quantize_uint8(embedding: &Array1<f32>) -> Quantized {
    let min_val = embedding.iter().copied().fold(f32::INFINITY, f32::min);
    let max_val = embedding.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let range = max_val - min_val;
    if !range.is_finite() || range < 1e-9 {
        // Constant (or empty) vector
        return Quantized {
            bytes: vec![0u8; embedding.len()],
            scale: 0.0,
            offset: if min_val.is_finite() { min_val } else { 0.0 },
        };
    }

    let scale = range / 255.0;
    let bytes = embedding
        .iter()
        .map(|&v| ((v - min_val) / scale).round().clamp(0.0, 255.0) as u8)
        .collect();

    Quantized {
        bytes,
        scale,
        offset: min_val,
    }
}

pub fn dequantize_uint8(bytes: &[u8], scale: f32, offset: f32) -> Array1<f32> {
    Array1::from_iter(bytes.iter().map(|&b| b as f32 * scale + offset))
}
