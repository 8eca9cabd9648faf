//! Certificate parsing pipeline.
//!
//! Composes the OCR collaborator, the field extractor, the content hash,
//! and the region cropper into one structured record. Unlike the
//! orchestrator, this pipeline has no partial-failure handling: the first
//! failing sub-step propagates, and a caller that needs partial results
//! calls the sub-components directly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use tracing::{debug, instrument};

use crate::crop::{RegionCropper, SignatureArtifact};
use crate::detect::RegionDetector;
use crate::error::Result;
use crate::extract::{CertificateFields, FieldExtractor};
use crate::ocr::TextRecognizer;

/// SHA3-256 digest of the document bytes, hex-encoded.
///
/// This is the certificate's identity: the deterministic key for all
/// ledger lookups (64 hex characters).
pub fn content_hash(document: &[u8]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(document);
    hex::encode(hasher.finalize())
}

/// Fully parsed certificate: structured fields, cropped signature
/// artifacts, and the content hash. Owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedCertificate {
    pub fields: CertificateFields,
    pub signature_artifacts: Vec<SignatureArtifact>,
    pub content_hash: String,
}

/// Pipeline turning a raw document image into a [`ParsedCertificate`].
pub struct CertificateParser {
    ocr: Arc<dyn TextRecognizer>,
    extractor: FieldExtractor,
    detector: Arc<dyn RegionDetector>,
    cropper: RegionCropper,
}

impl CertificateParser {
    pub fn new(
        ocr: Arc<dyn TextRecognizer>,
        extractor: FieldExtractor,
        detector: Arc<dyn RegionDetector>,
        cropper: RegionCropper,
    ) -> Self {
        Self {
            ocr,
            extractor,
            detector,
            cropper,
        }
    }

    /// Whether real models back both collaborators.
    pub fn is_loaded(&self) -> bool {
        self.ocr.is_loaded() && self.detector.is_loaded()
    }

    /// Parse a certificate document.
    ///
    /// `source_document` identifies the document in the produced
    /// artifacts (typically the sanitized upload filename).
    #[instrument(level = "info", skip(self, document), fields(source = source_document, bytes = document.len()))]
    pub async fn parse(
        &self,
        source_document: &str,
        document: &[u8],
    ) -> Result<ParsedCertificate> {
        let text = self.ocr.recognize(document).await?;
        debug!(chars = text.len(), "Recognized document text");

        let fields = self.extractor.extract(&text).await;
        let hash = content_hash(document);

        let detections = self.detector.detect(document).await?;
        debug!(detections = detections.len(), "Detector reported regions");

        let artifacts = self.cropper.crop(
            source_document,
            document,
            &detections,
            fields.student_name.as_deref(),
        )?;

        Ok(ParsedCertificate {
            fields,
            signature_artifacts: artifacts,
            content_hash: hash,
        })
    }
}
