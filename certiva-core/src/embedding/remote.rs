//! Remote embedding model client.
//!
//! Talks to an HTTP inference endpoint that wraps the actual embedding
//! network (facial or signature). The wire contract is a single JSON POST:
//! the image as base64 in, the embedding vector plus the number of
//! detected regions out.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use super::{EmbeddingModel, EmbeddingSource};
use crate::error::{CertivaError, Result};
use crate::http::{InferenceHttpClient, InferenceHttpConfig};

/// Configuration for the remote embedding model.
#[derive(Debug, Clone)]
pub struct RemoteEmbeddingConfig {
    /// Inference endpoint URL.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors.
    pub max_retries: u32,
}

impl RemoteEmbeddingConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    /// Base64-encoded image bytes.
    image: String,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    /// Number of regions (faces/signatures) the model detected.
    #[serde(default)]
    regions: Option<usize>,
    /// Embedding of the highest-confidence region.
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Embedding model backed by a remote inference endpoint.
pub struct RemoteEmbeddingModel {
    http: InferenceHttpClient,
    endpoint: String,
}

impl RemoteEmbeddingModel {
    pub fn new(config: RemoteEmbeddingConfig) -> Result<Self> {
        let http = InferenceHttpClient::new(InferenceHttpConfig {
            timeout: config.timeout,
            max_retries: config.max_retries,
            ..InferenceHttpConfig::default()
        })?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
        })
    }
}

#[async_trait]
impl EmbeddingModel for RemoteEmbeddingModel {
    #[instrument(level = "debug", skip_all, fields(endpoint = %self.endpoint, bytes = image.len()))]
    async fn embed(&self, image: &[u8]) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            image: BASE64.encode(image),
        };

        let response: EmbedResponse = self
            .http
            .post_json(
                &self.endpoint,
                &request,
                "embedding",
                CertivaError::EmbeddingUnavailable,
            )
            .await?;

        if response.regions == Some(0) || response.embedding.is_empty() {
            return Err(CertivaError::EmbeddingUnavailable(
                "no detectable region in input image".into(),
            ));
        }

        Ok(response.embedding)
    }

    fn source_id(&self) -> EmbeddingSource {
        EmbeddingSource::Remote
    }

    fn is_loaded(&self) -> bool {
        true
    }
}
