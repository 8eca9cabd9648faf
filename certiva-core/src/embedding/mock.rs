//! Mock embedding model for testing.

use async_trait::async_trait;

use super::{EmbeddingModel, EmbeddingSource};
use crate::error::{CertivaError, Result};

/// Default embedding dimensionality for the mock.
const DEFAULT_DIMENSION: usize = 128;

/// Deterministic embedding model for tests and degraded deployments.
///
/// Identical inputs map to identical embeddings (distance 0); distinct
/// inputs land on distinct basis axes of the embedding space (distance
/// sqrt(2) after normalization) unless their byte sums collide modulo the
/// dimension. WARNING: carries no biometric signal whatsoever - testing
/// only.
pub struct MockEmbeddingModel {
    dimension: usize,
}

impl MockEmbeddingModel {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Embed synchronously; the trait impl defers to this.
    pub fn embed_sync(&self, image: &[u8]) -> Result<Vec<f32>> {
        if image.is_empty() {
            return Err(CertivaError::EmbeddingUnavailable(
                "no detectable region in empty input".into(),
            ));
        }

        let index = image.iter().map(|b| *b as usize).sum::<usize>() % self.dimension;
        let mut embedding = vec![0.0f32; self.dimension];
        embedding[index] = 1.0;
        Ok(embedding)
    }
}

impl Default for MockEmbeddingModel {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingModel for MockEmbeddingModel {
    async fn embed(&self, image: &[u8]) -> Result<Vec<f32>> {
        self.embed_sync(image)
    }

    fn source_id(&self) -> EmbeddingSource {
        EmbeddingSource::Mock
    }

    fn is_loaded(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_deterministic() {
        let model = MockEmbeddingModel::default();
        let a = model.embed_sync(b"same input").unwrap();
        let b = model.embed_sync(b"same input").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_mock_distinct_inputs_distinct_axes() {
        let model = MockEmbeddingModel::default();
        // Byte sums differ modulo the dimension, so the axes differ.
        let a = model.embed_sync(b"AAAA").unwrap();
        let b = model.embed_sync(b"BBBB").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_mock_empty_input_unavailable() {
        let model = MockEmbeddingModel::default();
        let err = model.embed_sync(b"").unwrap_err();
        assert!(matches!(err, CertivaError::EmbeddingUnavailable(_)));
    }

    #[test]
    fn test_mock_dimension() {
        let model = MockEmbeddingModel::new(32);
        let embedding = model.embed_sync(b"input").unwrap();
        assert_eq!(embedding.len(), 32);
    }
}
