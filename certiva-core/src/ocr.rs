//! OCR collaborator.
//!
//! Text extraction from the scanned document happens in an external OCR
//! engine. The engine only depends on the [`TextRecognizer`] trait; the
//! remote implementation wraps an HTTP endpoint, the mock returns a
//! configured transcript for tests.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use crate::error::{CertivaError, Result};
use crate::http::{InferenceHttpClient, InferenceHttpConfig};

/// A service that turns a document image into raw text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<String>;

    /// Whether a real engine is loaded behind this instance.
    fn is_loaded(&self) -> bool;
}

/// Configuration for the remote OCR engine.
#[derive(Debug, Clone)]
pub struct RemoteOcrConfig {
    /// OCR endpoint URL.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors.
    pub max_retries: u32,
}

impl RemoteOcrConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(20),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Serialize)]
struct OcrRequest {
    /// Base64-encoded image bytes.
    image: String,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    text: String,
}

/// OCR backed by a remote endpoint.
pub struct RemoteTextRecognizer {
    http: InferenceHttpClient,
    endpoint: String,
}

impl RemoteTextRecognizer {
    pub fn new(config: RemoteOcrConfig) -> Result<Self> {
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
impl TextRecognizer for RemoteTextRecognizer {
    #[instrument(level = "debug", skip_all, fields(endpoint = %self.endpoint, bytes = image.len()))]
    async fn recognize(&self, image: &[u8]) -> Result<String> {
        let request = OcrRequest {
            image: BASE64.encode(image),
        };

        let response: OcrResponse = self
            .http
            .post_json(
                &self.endpoint,
                &request,
                "ocr",
                CertivaError::OcrUnavailable,
            )
            .await?;

        Ok(response.text.trim().to_string())
    }

    fn is_loaded(&self) -> bool {
        true
    }
}

/// Mock OCR returning a fixed transcript.
pub struct MockTextRecognizer {
    text: String,
}

impl MockTextRecognizer {
    pub fn returning(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl TextRecognizer for MockTextRecognizer {
    async fn recognize(&self, _image: &[u8]) -> Result<String> {
        Ok(self.text.clone())
    }

    fn is_loaded(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_recognizer_returns_transcript() {
        let recognizer = MockTextRecognizer::returning("CERTIFICATE TEXT");
        let text = recognizer.recognize(b"image").await.unwrap();
        assert_eq!(text, "CERTIFICATE TEXT");
        assert!(!recognizer.is_loaded());
    }

    #[test]
    fn test_ocr_response_parsing() {
        let json = r#"{"text": "  OCR OUTPUT  "}"#;
        let response: OcrResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text, "  OCR OUTPUT  ");
    }
}
