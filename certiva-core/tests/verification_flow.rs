//! End-to-end flow tests for the decision engine.
//!
//! Exercises the full parse -> anchor -> comprehensive-verify pipeline
//! with mock collaborators, including the degradation paths the
//! orchestrator must absorb without failing the request.

use std::sync::Arc;
use std::time::Duration;

use certiva_core::{
    content_hash, BoundingBox, CertificateFields, CertificateParser, Detection, FieldExtractor,
    ImagePair, InMemoryLedger, LedgerClient, MockEmbeddingModel, MockRegionDetector,
    MockTextRecognizer, OverallStatus, RegionCropper, Signal, VerificationConfig,
    VerificationEngine, SIGNATURE_CLASS_ID,
};
use image::{DynamicImage, RgbImage};

const TRANSCRIPT: &str = "\
RIVERSIDE STATE UNIVERSITY
This certifies that
JANE MARY SMITH
has been awarded the degree of
Bachelor of Science
major in Computer Science
Reg. No: RSU-2022-0042
Awarded on 12/09/2022";

fn sample_document() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 120, image::Rgb([250, 250, 250])));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode test image");
    bytes.into_inner()
}

fn build_parser(output_folder: &std::path::Path) -> CertificateParser {
    let detector = MockRegionDetector::returning(vec![Detection {
        bbox: BoundingBox::new(120, 90, 190, 115),
        class_id: SIGNATURE_CLASS_ID,
        confidence: 0.95,
    }]);

    CertificateParser::new(
        Arc::new(MockTextRecognizer::returning(TRANSCRIPT)),
        FieldExtractor::rules_only(),
        Arc::new(detector),
        RegionCropper::new(output_folder),
    )
}

fn build_engine(ledger: Arc<InMemoryLedger>) -> VerificationEngine {
    VerificationEngine::new(
        ledger,
        Arc::new(MockEmbeddingModel::default()),
        Arc::new(MockEmbeddingModel::default()),
        VerificationConfig {
            call_timeout: Duration::from_secs(2),
            ..VerificationConfig::default()
        },
    )
}

#[tokio::test]
async fn test_parse_anchor_verify_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let parser = build_parser(dir.path());
    let ledger = Arc::new(InMemoryLedger::new());
    let engine = build_engine(ledger.clone());

    let document = sample_document();
    let parsed = parser.parse("certificate.png", &document).await.unwrap();

    assert_eq!(parsed.content_hash, content_hash(&document));
    assert_eq!(parsed.fields.student_name.as_deref(), Some("Jane Mary Smith"));
    assert_eq!(
        parsed.fields.date_of_issue.as_deref(),
        Some("12 September 2022")
    );
    assert_eq!(parsed.signature_artifacts.len(), 1);

    // Anchor the parsed certificate, then verify against the same hash
    // with matching biometrics on both channels.
    ledger
        .store(&parsed.content_hash, &parsed.fields, None)
        .await
        .unwrap();

    let photo = ImagePair::new(b"portrait-ref".to_vec(), b"portrait-ref".to_vec());
    let signature = ImagePair::new(b"sig-ref".to_vec(), b"sig-ref".to_vec());
    let verdict = engine
        .verify_comprehensive(&parsed.content_hash, Some(&photo), Some(&signature))
        .await
        .unwrap();

    assert_eq!(verdict.overall_status, OverallStatus::Verified);
    assert_eq!(
        verdict.ledger_match.unwrap().stored_fields,
        parsed.fields
    );
    assert!(verdict.photo_result.unwrap().prediction);
    assert!(verdict.signature_result.unwrap().prediction);
}

#[tokio::test]
async fn test_tampered_document_misses_the_anchor() {
    let ledger = Arc::new(InMemoryLedger::new());
    let engine = build_engine(ledger.clone());

    let original = b"original certificate bytes".to_vec();
    ledger
        .store(&content_hash(&original), &CertificateFields::default(), None)
        .await
        .unwrap();

    // One flipped byte moves the content hash, so the lookup finds
    // nothing and the verdict cannot reach VERIFIED.
    let mut tampered = original.clone();
    tampered[0] ^= 0xFF;

    let verdict = engine
        .verify_comprehensive(&content_hash(&tampered), None, None)
        .await
        .unwrap();

    assert!(verdict.ledger_match.is_none());
    assert_eq!(verdict.overall_status, OverallStatus::Unverified);
}

#[tokio::test]
async fn test_partial_failure_keeps_other_signals() {
    let ledger = Arc::new(InMemoryLedger::new());
    let hash = "f".repeat(64);
    ledger
        .store(&hash, &CertificateFields::default(), None)
        .await
        .unwrap();
    let engine = build_engine(ledger);

    // Photo channel fails (no detectable region in an empty image);
    // the signature channel still resolves and drives the verdict.
    let broken_photo = ImagePair::new(Vec::new(), b"portrait".to_vec());
    let signature = ImagePair::new(b"sig-a".to_vec(), b"sig-a".to_vec());

    let verdict = engine
        .verify_comprehensive(&hash, Some(&broken_photo), Some(&signature))
        .await
        .unwrap();

    assert!(verdict.photo_result.is_none());
    assert!(verdict.signature_result.unwrap().prediction);
    assert_eq!(verdict.failures.len(), 1);
    assert_eq!(verdict.failures[0].signal, Signal::Photo);
    assert_eq!(verdict.overall_status, OverallStatus::Verified);
}
