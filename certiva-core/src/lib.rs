//! Certiva Core - certificate verification decision engine
//!
//! This crate reconciles three independently fallible evidence sources -
//! structured-field extraction from a scanned document, biometric
//! similarity between a claimed photo/signature and a reference, and a
//! tamper-evident ledger lookup keyed by the document's content hash -
//! into one explainable trust verdict.
//!
//! # Features
//!
//! - Similarity scoring shared by face and signature verification
//! - Layered field extraction (pattern rules, then generative fallback)
//! - Signature region cropping into addressable artifacts
//! - Ledger trust anchor with live and degraded modes
//! - Best-effort orchestration with per-signal failure attribution
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use certiva_core::{
//!     content_hash, InMemoryLedger, MockEmbeddingModel, VerificationConfig,
//!     VerificationEngine,
//! };
//!
//! # async fn example() -> certiva_core::Result<()> {
//! // In production the ledger and the embedding models are the live
//! // implementations, selected by configuration.
//! let engine = VerificationEngine::new(
//!     Arc::new(InMemoryLedger::new()),
//!     Arc::new(MockEmbeddingModel::default()),
//!     Arc::new(MockEmbeddingModel::default()),
//!     VerificationConfig::default(),
//! );
//!
//! let hash = content_hash(b"certificate bytes");
//! let verdict = engine.verify_comprehensive(&hash, None, None).await?;
//! println!("{:?}", verdict.overall_status);
//! # Ok(())
//! # }
//! ```

pub mod crop;
pub mod detect;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod http;
pub mod ledger;
pub mod ocr;
pub mod parser;
pub mod similarity;
pub mod verify;

// Re-export main types for convenience
pub use crop::{
    BoundingBox, Detection, RegionCropper, SignatureArtifact, SIGNATURE_CLASS_ID,
};
pub use detect::{MockRegionDetector, RegionDetector, RemoteDetectorConfig, RemoteRegionDetector};
pub use embedding::{
    EmbeddingConfig, EmbeddingModel, EmbeddingModelFactory, EmbeddingSource, MockEmbeddingModel,
    RemoteEmbeddingConfig, RemoteEmbeddingModel,
};
pub use error::{CertivaError, Result};
pub use extract::{
    clean_text, CertificateFields, FieldExtractionBackend, FieldExtractor,
    MockExtractionBackend, RemoteExtractionBackend, RemoteExtractionConfig,
};
pub use ledger::{
    validate_account_address, validate_certificate_hash, HttpLedger, HttpLedgerConfig,
    InMemoryLedger, LedgerClient, LedgerConfig, LedgerFactory, LedgerMode, LedgerRecord,
    ACCOUNT_ADDRESS_LEN, CERTIFICATE_HASH_LEN, PLACEHOLDER_ADDRESS,
};
pub use ocr::{MockTextRecognizer, RemoteOcrConfig, RemoteTextRecognizer, TextRecognizer};
pub use parser::{content_hash, CertificateParser, ParsedCertificate};
pub use similarity::{compare, DistanceMetric, EmbeddingPair, SimilarityResult};
pub use verify::{
    ComprehensiveVerdict, EngineHealth, ImagePair, OverallStatus, Signal, SignalFailure,
    VerificationConfig, VerificationEngine, DEFAULT_FACE_THRESHOLD, DEFAULT_SIGNATURE_THRESHOLD,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Integration test: anchor a parsed certificate, then verify it
    /// comprehensively with a matching photo pair.
    #[tokio::test]
    async fn test_full_anchor_and_verify_workflow() {
        let ledger = Arc::new(InMemoryLedger::new());
        let engine = VerificationEngine::new(
            ledger.clone(),
            Arc::new(MockEmbeddingModel::default()),
            Arc::new(MockEmbeddingModel::default()),
            VerificationConfig::default(),
        );

        // Step 1: anchor the certificate under its content hash.
        let document = b"certificate document bytes".to_vec();
        let hash = content_hash(&document);
        let fields = CertificateFields {
            student_name: Some("Jane Mary Smith".into()),
            ..CertificateFields::default()
        };
        ledger
            .store(&hash, &fields, None)
            .await
            .expect("Failed to anchor record");

        // Step 2: verify with a matching photo pair.
        let pair = ImagePair::new(b"portrait".to_vec(), b"portrait".to_vec());
        let verdict = engine
            .verify_comprehensive(&hash, Some(&pair), None)
            .await
            .expect("Verification failed");

        assert_eq!(verdict.overall_status, OverallStatus::Verified);
        let record = verdict.ledger_match.expect("record should be found");
        assert_eq!(record.stored_fields, fields);
        assert_eq!(record.submitter_address, PLACEHOLDER_ADDRESS);
    }

    /// Different documents must map to different ledger keys.
    #[test]
    fn test_different_content_different_hash() {
        let hash1 = content_hash(b"Content A");
        let hash2 = content_hash(b"Content B");
        assert_ne!(hash1, hash2);
        assert!(validate_certificate_hash(&hash1).is_ok());
    }
}
