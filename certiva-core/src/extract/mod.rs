//! Structured-field extraction from certificate text.
//!
//! Raw OCR output is noisy, so extraction is layered: a cleaning pass
//! strips characters outside a conservative allow-list, anchored pattern
//! rules take a first shot at each field, and a generative backend fills
//! whatever the rules left empty. Fields are extracted independently -
//! first success per field wins, and a backend outage degrades gracefully
//! to the rule results instead of failing the whole extraction.

mod generative;
mod rules;

pub use generative::{
    FieldExtractionBackend, MockExtractionBackend, RemoteExtractionBackend,
    RemoteExtractionConfig,
};
pub use rules::extract_with_rules;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// The fixed field set extracted from a certificate.
///
/// `None` means "not found" - never an empty string, never the literal
/// string "null". Consumed read-only downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateFields {
    pub student_name: Option<String>,
    pub institute_name: Option<String>,
    pub degree: Option<String>,
    pub major: Option<String>,
    pub date_of_issue: Option<String>,
    pub certificate_id: Option<String>,
}

impl CertificateFields {
    /// Whether every field was found.
    pub fn is_complete(&self) -> bool {
        self.student_name.is_some()
            && self.institute_name.is_some()
            && self.degree.is_some()
            && self.major.is_some()
            && self.date_of_issue.is_some()
            && self.certificate_id.is_some()
    }

    /// Fill fields still missing here from `other`.
    pub fn merge_missing(&mut self, other: CertificateFields) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.student_name, other.student_name);
        fill(&mut self.institute_name, other.institute_name);
        fill(&mut self.degree, other.degree);
        fill(&mut self.major, other.major);
        fill(&mut self.date_of_issue, other.date_of_issue);
        fill(&mut self.certificate_id, other.certificate_id);
    }
}

/// Characters allowed through the OCR-noise filter, besides alphanumerics
/// and whitespace.
const ALLOWED_PUNCTUATION: &str = ".,;:!?()@%&/-";

/// Strip characters outside the allow-list to reduce OCR noise before
/// pattern matching or generative submission.
pub fn clean_text(raw: &str) -> String {
    raw.chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(*c)
        })
        .collect()
}

/// Layered field extractor: pattern rules first, generative fill-in after.
pub struct FieldExtractor {
    backend: Option<Arc<dyn FieldExtractionBackend>>,
}

impl FieldExtractor {
    /// Extractor with pattern rules only.
    pub fn rules_only() -> Self {
        Self { backend: None }
    }

    /// Extractor with a generative backend filling fields the rules miss.
    pub fn with_backend(backend: Arc<dyn FieldExtractionBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Extract fields from document text.
    ///
    /// Pattern rules run first; if any field is still missing and a
    /// backend is configured, the backend fills the gaps. A backend
    /// failure is logged and the rule results are returned as-is -
    /// graceful degradation, not all-or-nothing.
    pub async fn extract(&self, document_text: &str) -> CertificateFields {
        let cleaned = clean_text(document_text);
        let mut fields = extract_with_rules(&cleaned);

        if fields.is_complete() {
            return fields;
        }

        if let Some(backend) = &self.backend {
            match backend.extract_fields(&cleaned).await {
                Ok(generated) => {
                    debug!("Filled missing fields from generative backend");
                    fields.merge_missing(generated);
                }
                Err(e) => {
                    warn!(error = %e, "Generative backend failed, returning rule results");
                }
            }
        }

        fields
    }

    /// Extract fields through the generative backend alone, for callers
    /// that want richer extraction than the rule engine offers.
    ///
    /// Unlike [`extract`](Self::extract), a backend failure propagates.
    pub async fn extract_generative(&self, document_text: &str) -> Result<CertificateFields> {
        let backend = self.backend.as_ref().ok_or_else(|| {
            crate::CertivaError::ExtractionUnavailable(
                "no generative backend configured".into(),
            )
        })?;

        let cleaned = clean_text(document_text);
        backend.extract_fields(&cleaned).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_noise() {
        let raw = "Bachelor of Science* <noise> #12/09/2022 [ok]";
        let cleaned = clean_text(raw);
        assert_eq!(cleaned, "Bachelor of Science noise 12/09/2022 ok");
    }

    #[test]
    fn test_merge_missing_keeps_existing() {
        let mut fields = CertificateFields {
            student_name: Some("John Doe".into()),
            ..CertificateFields::default()
        };
        fields.merge_missing(CertificateFields {
            student_name: Some("Other Name".into()),
            degree: Some("Bachelor Of Science".into()),
            ..CertificateFields::default()
        });

        assert_eq!(fields.student_name.as_deref(), Some("John Doe"));
        assert_eq!(fields.degree.as_deref(), Some("Bachelor Of Science"));
    }

    #[tokio::test]
    async fn test_extract_degrades_when_backend_unavailable() {
        let extractor = FieldExtractor::with_backend(Arc::new(MockExtractionBackend::offline()));
        let fields = extractor
            .extract("This University certifies achievement")
            .await;
        // Rules still found the institute line despite the outage.
        assert!(fields.institute_name.is_some());
    }

    #[tokio::test]
    async fn test_extract_fills_missing_from_backend() {
        let backend_fields = CertificateFields {
            major: Some("Computer Science".into()),
            ..CertificateFields::default()
        };
        let extractor =
            FieldExtractor::with_backend(Arc::new(MockExtractionBackend::returning(
                backend_fields,
            )));

        let fields = extractor.extract("Riverside University").await;
        assert_eq!(fields.institute_name.as_deref(), Some("Riverside University"));
        assert_eq!(fields.major.as_deref(), Some("Computer Science"));
    }

    #[tokio::test]
    async fn test_extract_generative_requires_backend() {
        let extractor = FieldExtractor::rules_only();
        assert!(extractor.extract_generative("any text").await.is_err());
    }
}
