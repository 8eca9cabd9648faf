//! Region detection collaborator.
//!
//! The detector that finds signature regions on a document is an external
//! model; the engine only depends on the [`RegionDetector`] trait. The
//! remote implementation wraps an HTTP inference endpoint, the mock
//! replays a configured detection list for tests.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use crate::crop::Detection;
use crate::error::{CertivaError, Result};
use crate::http::{InferenceHttpClient, InferenceHttpConfig};

/// A model that locates regions of interest on a document image.
#[async_trait]
pub trait RegionDetector: Send + Sync {
    /// Detect regions on the given document image.
    async fn detect(&self, image: &[u8]) -> Result<Vec<Detection>>;

    /// Whether a real model is loaded behind this instance.
    fn is_loaded(&self) -> bool;
}

/// Configuration for the remote region detector.
#[derive(Debug, Clone)]
pub struct RemoteDetectorConfig {
    /// Inference endpoint URL.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors.
    pub max_retries: u32,
}

impl RemoteDetectorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(15),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectRequest {
    /// Base64-encoded image bytes.
    image: String,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<Detection>,
}

/// Region detector backed by a remote inference endpoint.
pub struct RemoteRegionDetector {
    http: InferenceHttpClient,
    endpoint: String,
}

impl RemoteRegionDetector {
    pub fn new(config: RemoteDetectorConfig) -> Result<Self> {
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
impl RegionDetector for RemoteRegionDetector {
    #[instrument(level = "debug", skip_all, fields(endpoint = %self.endpoint, bytes = image.len()))]
    async fn detect(&self, image: &[u8]) -> Result<Vec<Detection>> {
        let request = DetectRequest {
            image: BASE64.encode(image),
        };

        let response: DetectResponse = self
            .http
            .post_json(
                &self.endpoint,
                &request,
                "detector",
                CertivaError::DetectorUnavailable,
            )
            .await?;

        Ok(response.detections)
    }

    fn is_loaded(&self) -> bool {
        true
    }
}

/// Mock detector replaying a fixed detection list.
#[derive(Default)]
pub struct MockRegionDetector {
    detections: Vec<Detection>,
}

impl MockRegionDetector {
    /// A detector that reports the given regions for every image.
    pub fn returning(detections: Vec<Detection>) -> Self {
        Self { detections }
    }

    /// A detector that never finds anything.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegionDetector for MockRegionDetector {
    async fn detect(&self, _image: &[u8]) -> Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }

    fn is_loaded(&self) -> bool {
        false
    }
}
