//! Embedding generation and vector similarity.

use crate::provider::{Provider, ProviderError};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbedderError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("vector length mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

pub type Result<T> = std::result::Result<T, EmbedderError>;

/// Generates vector embeddings through the configured provider.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Generates an embedding vector for the given text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.provider
            .embed(text, &self.model)
            .await
            .map_err(EmbedderError::Provider)
    }
}

/// Cosine similarity of two equal-length vectors.
///
/// `dot(a, b) / (|a| * |b|)`; self-similarity of any non-zero vector is
/// 1.0 within floating tolerance. Zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbedderError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_similarity_is_one() {
        let v = vec![0.3, -1.2, 4.5, 0.01];
        let similarity = cosine_similarity(&v, &v).unwrap();
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let similarity = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(similarity.abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let similarity = cosine_similarity(&[2.0, 1.0], &[-2.0, -1.0]).unwrap();
        assert!((similarity + 1.0).abs() < 1e-6);
    }

    #[test]
    fn length_mismatch_fails() {
        let result = cosine_similarity(&[1.0, 2.0], &[1.0]);
        assert!(matches!(
            result,
            Err(EmbedderError::DimensionMismatch { left: 2, right: 1 })
        ));
    }

    #[test]
    fn zero_vector_scores_zero() {
        let similarity = cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap();
        assert_eq!(similarity, 0.0);
    }
}
