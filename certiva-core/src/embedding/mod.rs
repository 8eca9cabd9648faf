//! Embedding model abstraction for biometric comparisons.
//!
//! The decision engine never computes embeddings itself; it depends on an
//! [`EmbeddingModel`] collaborator. Two implementations exist:
//!
//! - [`RemoteEmbeddingModel`] - HTTP inference endpoint (production)
//! - [`MockEmbeddingModel`] - deterministic in-process mock (testing,
//!   degraded deployments)
//!
//! Which one is used is an explicit configuration decision, never an
//! import-time fallback.

mod mock;
mod remote;

pub use mock::MockEmbeddingModel;
pub use remote::{RemoteEmbeddingConfig, RemoteEmbeddingModel};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifies which backend produced an embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingSource {
    /// Remote inference endpoint.
    Remote,
    /// Deterministic mock (testing only).
    Mock,
}

/// A model that turns an image into a fixed-length identity embedding.
///
/// Implementations must be safe for concurrent inference calls; instances
/// are loaded once at process start and shared read-only across requests.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Produce an identity embedding for the given image bytes.
    ///
    /// Fails with [`crate::CertivaError::EmbeddingUnavailable`] when no
    /// face/signature region can be detected in the input; the caller
    /// decides whether to re-acquire the input, this layer never retries.
    async fn embed(&self, image: &[u8]) -> Result<Vec<f32>>;

    /// Which backend this model is.
    fn source_id(&self) -> EmbeddingSource;

    /// Whether a real model is loaded behind this instance.
    fn is_loaded(&self) -> bool;
}

/// Configuration for creating embedding models.
#[derive(Debug, Clone)]
pub enum EmbeddingConfig {
    /// Remote inference endpoint.
    Remote(RemoteEmbeddingConfig),
    /// Deterministic mock with the given dimensionality.
    Mock { dimension: usize },
}

/// Factory for creating embedding models from configuration.
pub struct EmbeddingModelFactory;

impl EmbeddingModelFactory {
    /// Create an embedding model from configuration.
    pub fn create(config: EmbeddingConfig) -> Result<Arc<dyn EmbeddingModel>> {
        match config {
            EmbeddingConfig::Remote(remote_config) => {
                let model = RemoteEmbeddingModel::new(remote_config)?;
                Ok(Arc::new(model))
            }
            EmbeddingConfig::Mock { dimension } => {
                Ok(Arc::new(MockEmbeddingModel::new(dimension)))
            }
        }
    }

    /// Create a mock model for testing.
    pub fn create_mock() -> Arc<dyn EmbeddingModel> {
        Arc::new(MockEmbeddingModel::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_model() {
        let model = EmbeddingModelFactory::create_mock();
        assert_eq!(model.source_id(), EmbeddingSource::Mock);
        assert!(!model.is_loaded());
    }

    #[test]
    fn test_create_from_mock_config() {
        let model = EmbeddingModelFactory::create(EmbeddingConfig::Mock { dimension: 64 });
        assert!(model.is_ok());
    }
}
