//! Comprehensive verification orchestrator.
//!
//! The decision engine proper: fans out the ledger lookup and the (up to
//! two) biometric comparisons concurrently, captures each signal's outcome
//! locally, and folds them into one explainable verdict. No sub-step
//! failure aborts the others - a missing ledger entry, a failed
//! comparison, or an omitted input each degrade only their own signal.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use crate::embedding::EmbeddingModel;
use crate::error::{CertivaError, Result};
use crate::ledger::{validate_certificate_hash, LedgerClient, LedgerMode, LedgerRecord};
use crate::similarity::{compare, DistanceMetric, SimilarityResult};

/// Default match threshold for facial comparisons.
pub const DEFAULT_FACE_THRESHOLD: f32 = 0.9;

/// Default match threshold for signature comparisons.
pub const DEFAULT_SIGNATURE_THRESHOLD: f32 = 0.5;

/// Aggregate trust verdict over all requested signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    /// Ledger match present and every performed comparison positive.
    Verified,
    /// Ledger match present with a negative comparison, or no ledger
    /// match but every performed comparison positive.
    Partial,
    /// No ledger match and either a negative comparison or no
    /// comparisons at all.
    Unverified,
    /// An unexpected internal failure occurred during orchestration.
    Error,
}

/// Evidence source within one comprehensive verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Ledger,
    Photo,
    Signature,
}

/// Failure attribution for one signal that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFailure {
    pub signal: Signal,
    pub reason: String,
}

/// Result of one comprehensive verification request. Derived, recomputed
/// per request, never persisted by the engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveVerdict {
    pub ledger_match: Option<LedgerRecord>,
    pub photo_result: Option<SimilarityResult>,
    pub signature_result: Option<SimilarityResult>,
    pub overall_status: OverallStatus,
    /// Per-signal failure attribution; empty when every requested signal
    /// resolved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SignalFailure>,
}

/// Two images queued for a biometric comparison.
#[derive(Debug, Clone)]
pub struct ImagePair {
    pub first: Vec<u8>,
    pub second: Vec<u8>,
}

impl ImagePair {
    pub fn new(first: Vec<u8>, second: Vec<u8>) -> Self {
        Self { first, second }
    }
}

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Match threshold for facial comparisons.
    pub face_threshold: f32,
    /// Match threshold for signature comparisons.
    pub signature_threshold: f32,
    /// Distance metric for both comparison kinds.
    pub metric: DistanceMetric,
    /// Upper bound on each external call (ledger query, one embedding
    /// inference). Timeouts convert into the corresponding unavailable
    /// outcome instead of blocking the request.
    pub call_timeout: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            face_threshold: DEFAULT_FACE_THRESHOLD,
            signature_threshold: DEFAULT_SIGNATURE_THRESHOLD,
            metric: DistanceMetric::Euclidean,
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// Engine health snapshot for the service health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EngineHealth {
    pub ledger_mode: LedgerMode,
    pub face_model_loaded: bool,
    pub signature_model_loaded: bool,
}

/// Outcome of one fan-out branch, captured locally.
enum Outcome<T> {
    Found(T),
    Absent,
    Failed { reason: String, unexpected: bool },
}

/// The certificate verification decision engine.
///
/// Collaborators are injected once at construction and shared read-only
/// across concurrent requests; the engine holds no per-request state.
pub struct VerificationEngine {
    ledger: Arc<dyn LedgerClient>,
    face_model: Arc<dyn EmbeddingModel>,
    signature_model: Arc<dyn EmbeddingModel>,
    config: VerificationConfig,
}

impl VerificationEngine {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        face_model: Arc<dyn EmbeddingModel>,
        signature_model: Arc<dyn EmbeddingModel>,
        config: VerificationConfig,
    ) -> Self {
        Self {
            ledger,
            face_model,
            signature_model,
            config,
        }
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Health snapshot of the injected collaborators.
    pub fn health(&self) -> EngineHealth {
        EngineHealth {
            ledger_mode: self.ledger.mode(),
            face_model_loaded: self.face_model.is_loaded(),
            signature_model_loaded: self.signature_model.is_loaded(),
        }
    }

    /// Compare two face images. `threshold` falls back to the configured
    /// default when omitted.
    pub async fn verify_faces(
        &self,
        first: &[u8],
        second: &[u8],
        threshold: Option<f32>,
    ) -> Result<SimilarityResult> {
        let threshold = threshold.unwrap_or(self.config.face_threshold);
        self.compare_pair(self.face_model.as_ref(), first, second, threshold)
            .await
    }

    /// Compare two signature images. `threshold` falls back to the
    /// configured default when omitted.
    pub async fn verify_signatures(
        &self,
        first: &[u8],
        second: &[u8],
        threshold: Option<f32>,
    ) -> Result<SimilarityResult> {
        let threshold = threshold.unwrap_or(self.config.signature_threshold);
        self.compare_pair(self.signature_model.as_ref(), first, second, threshold)
            .await
    }

    /// Run the comprehensive verification protocol.
    ///
    /// The hash format is validated up front ([`CertivaError::InvalidHash`]
    /// fails the request before any lookup); everything after that is a
    /// best-effort fan-out with per-signal capture.
    #[instrument(level = "info", skip_all, fields(hash = certificate_hash))]
    pub async fn verify_comprehensive(
        &self,
        certificate_hash: &str,
        photo_pair: Option<&ImagePair>,
        signature_pair: Option<&ImagePair>,
    ) -> Result<ComprehensiveVerdict> {
        validate_certificate_hash(certificate_hash)?;

        let (ledger_outcome, photo_outcome, signature_outcome) = tokio::join!(
            self.ledger_lookup(certificate_hash),
            self.comparison(
                Signal::Photo,
                self.face_model.as_ref(),
                photo_pair,
                self.config.face_threshold,
            ),
            self.comparison(
                Signal::Signature,
                self.signature_model.as_ref(),
                signature_pair,
                self.config.signature_threshold,
            ),
        );

        let mut failures = Vec::new();
        let mut unexpected = false;
        let mut predictions = Vec::new();

        let ledger_match = collect(
            Signal::Ledger,
            ledger_outcome,
            &mut failures,
            &mut unexpected,
        );
        let photo_result = collect(
            Signal::Photo,
            photo_outcome,
            &mut failures,
            &mut unexpected,
        );
        let signature_result = collect(
            Signal::Signature,
            signature_outcome,
            &mut failures,
            &mut unexpected,
        );

        predictions.extend(photo_result.iter().map(|r| r.prediction));
        predictions.extend(signature_result.iter().map(|r| r.prediction));

        let overall_status = if unexpected {
            OverallStatus::Error
        } else {
            derive_status(ledger_match.is_some(), &predictions)
        };

        info!(
            status = ?overall_status,
            ledger_match = ledger_match.is_some(),
            comparisons = predictions.len(),
            failures = failures.len(),
            "Comprehensive verification completed"
        );

        Ok(ComprehensiveVerdict {
            ledger_match,
            photo_result,
            signature_result,
            overall_status,
            failures,
        })
    }

    async fn ledger_lookup(&self, certificate_hash: &str) -> Outcome<LedgerRecord> {
        let result = bounded(self.config.call_timeout, self.ledger.get(certificate_hash), || {
            CertivaError::LedgerUnavailable("ledger query timed out".into())
        })
        .await;

        match result {
            Ok(Some(record)) => Outcome::Found(record),
            Ok(None) => Outcome::Absent,
            Err(e) => failed(Signal::Ledger, e),
        }
    }

    async fn comparison(
        &self,
        signal: Signal,
        model: &dyn EmbeddingModel,
        pair: Option<&ImagePair>,
        threshold: f32,
    ) -> Outcome<SimilarityResult> {
        let Some(pair) = pair else {
            return Outcome::Absent;
        };

        match self
            .compare_pair(model, &pair.first, &pair.second, threshold)
            .await
        {
            Ok(result) => Outcome::Found(result),
            Err(e) => failed(signal, e),
        }
    }

    async fn compare_pair(
        &self,
        model: &dyn EmbeddingModel,
        first: &[u8],
        second: &[u8],
        threshold: f32,
    ) -> Result<SimilarityResult> {
        let limit = self.config.call_timeout;
        let (a, b) = tokio::try_join!(
            bounded(limit, model.embed(first), || CertivaError::EmbeddingUnavailable(
                "embedding inference timed out".into()
            )),
            bounded(limit, model.embed(second), || CertivaError::EmbeddingUnavailable(
                "embedding inference timed out".into()
            )),
        )?;

        compare(&a, &b, self.config.metric, threshold)
    }
}

/// Apply the per-call timeout, converting elapsed time into the branch's
/// unavailable error.
async fn bounded<T, F>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce() -> CertivaError,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout()),
    }
}

/// Fold one branch outcome into the verdict, recording attribution.
fn collect<T>(
    signal: Signal,
    outcome: Outcome<T>,
    failures: &mut Vec<SignalFailure>,
    unexpected: &mut bool,
) -> Option<T> {
    match outcome {
        Outcome::Found(value) => Some(value),
        Outcome::Absent => None,
        Outcome::Failed {
            reason,
            unexpected: u,
        } => {
            failures.push(SignalFailure { signal, reason });
            *unexpected |= u;
            None
        }
    }
}

fn failed<T>(signal: Signal, error: CertivaError) -> Outcome<T> {
    let unexpected = !is_expected_failure(&error);
    if unexpected {
        warn!(signal = ?signal, error = %error, "Unexpected failure in verification branch");
    } else {
        warn!(signal = ?signal, error = %error, "Signal unavailable");
    }
    Outcome::Failed {
        reason: error.to_string(),
        unexpected,
    }
}

/// Whether an error is a well-formed "signal unavailable" outcome, as
/// opposed to an unexpected internal failure.
fn is_expected_failure(error: &CertivaError) -> bool {
    matches!(
        error,
        CertivaError::EmbeddingUnavailable(_)
            | CertivaError::InvalidEmbedding(_)
            | CertivaError::LedgerUnavailable(_)
            | CertivaError::ImageUnreadable(_)
            | CertivaError::Http(_)
    )
}

/// Decision table over the performed comparisons.
///
/// A supplied pair whose comparison failed is excluded here; its absence
/// is visible in the verdict's failure attribution instead.
fn derive_status(ledger_present: bool, predictions: &[bool]) -> OverallStatus {
    let any_false = predictions.iter().any(|p| !*p);

    if ledger_present {
        if any_false {
            OverallStatus::Partial
        } else {
            OverallStatus::Verified
        }
    } else if any_false {
        OverallStatus::Unverified
    } else if predictions.is_empty() {
        OverallStatus::Unverified
    } else {
        OverallStatus::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingModel;
    use crate::extract::CertificateFields;
    use crate::ledger::InMemoryLedger;

    fn sample_hash() -> String {
        "d".repeat(64)
    }

    fn engine_with_ledger(ledger: Arc<InMemoryLedger>) -> VerificationEngine {
        VerificationEngine::new(
            ledger,
            Arc::new(MockEmbeddingModel::default()),
            Arc::new(MockEmbeddingModel::default()),
            VerificationConfig::default(),
        )
    }

    async fn anchored_engine() -> VerificationEngine {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger
            .store(&sample_hash(), &CertificateFields::default(), None)
            .await
            .expect("seed record");
        engine_with_ledger(ledger)
    }

    // The mock embedding model maps identical inputs to identical
    // embeddings and distinct inputs (distinct byte sums) to orthogonal
    // axes, so these pairs are guaranteed matches / mismatches.
    fn matching_pair() -> ImagePair {
        ImagePair::new(b"AAAA".to_vec(), b"AAAA".to_vec())
    }

    fn mismatched_pair() -> ImagePair {
        ImagePair::new(b"AAAA".to_vec(), b"BBBB".to_vec())
    }

    #[tokio::test]
    async fn test_ledger_hit_and_photo_match_is_verified() {
        let engine = anchored_engine().await;

        let verdict = engine
            .verify_comprehensive(&sample_hash(), Some(&matching_pair()), None)
            .await
            .unwrap();

        assert_eq!(verdict.overall_status, OverallStatus::Verified);
        assert!(verdict.ledger_match.is_some());
        assert!(verdict.photo_result.unwrap().prediction);
        assert!(verdict.signature_result.is_none());
        assert!(verdict.failures.is_empty());
    }

    #[tokio::test]
    async fn test_ledger_miss_and_signature_mismatch_is_unverified() {
        let engine = engine_with_ledger(Arc::new(InMemoryLedger::new()));

        let verdict = engine
            .verify_comprehensive(&sample_hash(), None, Some(&mismatched_pair()))
            .await
            .unwrap();

        assert_eq!(verdict.overall_status, OverallStatus::Unverified);
        assert!(verdict.ledger_match.is_none());
        assert!(!verdict.signature_result.unwrap().prediction);
    }

    #[tokio::test]
    async fn test_ledger_hit_with_one_mismatch_is_partial() {
        let engine = anchored_engine().await;

        let verdict = engine
            .verify_comprehensive(
                &sample_hash(),
                Some(&matching_pair()),
                Some(&mismatched_pair()),
            )
            .await
            .unwrap();

        assert_eq!(verdict.overall_status, OverallStatus::Partial);
        assert!(verdict.photo_result.unwrap().prediction);
        assert!(!verdict.signature_result.unwrap().prediction);
    }

    #[tokio::test]
    async fn test_ledger_miss_with_all_matches_is_partial() {
        let engine = engine_with_ledger(Arc::new(InMemoryLedger::new()));

        let verdict = engine
            .verify_comprehensive(&sample_hash(), Some(&matching_pair()), None)
            .await
            .unwrap();

        assert_eq!(verdict.overall_status, OverallStatus::Partial);
    }

    #[tokio::test]
    async fn test_nothing_supplied_and_ledger_miss_is_unverified() {
        let engine = engine_with_ledger(Arc::new(InMemoryLedger::new()));

        let verdict = engine
            .verify_comprehensive(&sample_hash(), None, None)
            .await
            .unwrap();

        assert_eq!(verdict.overall_status, OverallStatus::Unverified);
    }

    #[tokio::test]
    async fn test_ledger_hit_alone_is_verified() {
        let engine = anchored_engine().await;

        let verdict = engine
            .verify_comprehensive(&sample_hash(), None, None)
            .await
            .unwrap();

        assert_eq!(verdict.overall_status, OverallStatus::Verified);
    }

    #[tokio::test]
    async fn test_malformed_hash_fails_fast() {
        let engine = engine_with_ledger(Arc::new(InMemoryLedger::new()));

        let malformed = ["short".to_string(), "e".repeat(63), "e".repeat(65)];
        for hash in &malformed {
            let err = engine
                .verify_comprehensive(hash, None, None)
                .await
                .unwrap_err();
            assert!(matches!(err, CertivaError::InvalidHash(_)), "{hash}");
        }
    }

    #[tokio::test]
    async fn test_embedding_failure_is_attributed_not_escalated() {
        let engine = anchored_engine().await;
        // Empty image: the mock reports no detectable region.
        let broken_pair = ImagePair::new(Vec::new(), b"AAAA".to_vec());

        let verdict = engine
            .verify_comprehensive(&sample_hash(), Some(&broken_pair), None)
            .await
            .unwrap();

        assert!(verdict.photo_result.is_none());
        assert_eq!(verdict.failures.len(), 1);
        assert_eq!(verdict.failures[0].signal, Signal::Photo);
        // The failed comparison is excluded from the status arithmetic.
        assert_eq!(verdict.overall_status, OverallStatus::Verified);
    }

    #[tokio::test]
    async fn test_verify_faces_uses_default_threshold() {
        let engine = engine_with_ledger(Arc::new(InMemoryLedger::new()));

        let result = engine.verify_faces(b"AAAA", b"AAAA", None).await.unwrap();
        assert_eq!(result.threshold, DEFAULT_FACE_THRESHOLD);
        assert!(result.prediction);

        let result = engine
            .verify_signatures(b"AAAA", b"BBBB", Some(2.0))
            .await
            .unwrap();
        assert_eq!(result.threshold, 2.0);
        // Orthogonal axes sit sqrt(2) apart, inside a 2.0 threshold.
        assert!(result.prediction);
    }

    #[test]
    fn test_derive_status_table() {
        use OverallStatus::*;

        assert_eq!(derive_status(true, &[]), Verified);
        assert_eq!(derive_status(true, &[true, true]), Verified);
        assert_eq!(derive_status(true, &[true, false]), Partial);
        assert_eq!(derive_status(false, &[true]), Partial);
        assert_eq!(derive_status(false, &[false]), Unverified);
        assert_eq!(derive_status(false, &[true, false]), Unverified);
        assert_eq!(derive_status(false, &[]), Unverified);
    }

    #[test]
    fn test_status_serialization_shape() {
        let json = serde_json::to_string(&OverallStatus::Verified).unwrap();
        assert_eq!(json, r#""VERIFIED""#);
        let json = serde_json::to_string(&OverallStatus::Unverified).unwrap();
        assert_eq!(json, r#""UNVERIFIED""#);
    }
}
