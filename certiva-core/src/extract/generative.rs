//! Generative fallback for field extraction.
//!
//! When pattern rules leave fields empty, the cleaned certificate text is
//! submitted to a text-generation endpoint constrained to emit the same
//! field set as strict JSON. The backend is an external collaborator: it
//! may be slow or down, and either condition surfaces as
//! [`CertivaError::ExtractionUnavailable`] for the caller to degrade on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

use super::CertificateFields;
use crate::error::{CertivaError, Result};
use crate::http::{InferenceHttpClient, InferenceHttpConfig};

/// Instruction sent to the generation endpoint. The response contract is
/// strict JSON with exactly the six certificate fields, JSON null for
/// anything missing.
const EXTRACTION_PROMPT: &str = r#"You are an assistant specialized in extracting information from student certificates.
Extract the following fields from the certificate text.
If a field is missing, set its value to null (the JSON null literal, not the string "null").

- Student Name
- Institute Name
- Degree
- Major/Specialization
- Date of Issue
- Certificate ID / Registration Number

Return the output in strict JSON format, like:

{
  "student_name": "...",
  "institute_name": "...",
  "degree": "...",
  "major": "...",
  "date_of_issue": "...",
  "certificate_id": "..."
}

Certificate Text:
"#;

/// A backend able to extract certificate fields from free text.
#[async_trait]
pub trait FieldExtractionBackend: Send + Sync {
    async fn extract_fields(&self, text: &str) -> Result<CertificateFields>;
}

/// Configuration for the remote generative backend.
#[derive(Debug, Clone)]
pub struct RemoteExtractionConfig {
    /// Text-generation endpoint URL.
    pub endpoint: String,
    /// Model identifier passed through to the endpoint.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors.
    pub max_retries: u32,
}

impl RemoteExtractionConfig {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            timeout: Duration::from_secs(30),
            max_retries: 1,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest {
    model: String,
    prompt: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    content: String,
}

/// Raw field payload as the model emits it, before null normalization.
#[derive(Debug, Deserialize)]
struct RawFields {
    #[serde(default)]
    student_name: Option<String>,
    #[serde(default)]
    institute_name: Option<String>,
    #[serde(default)]
    degree: Option<String>,
    #[serde(default)]
    major: Option<String>,
    #[serde(default)]
    date_of_issue: Option<String>,
    #[serde(default)]
    certificate_id: Option<String>,
}

/// Field extraction backed by a remote text-generation endpoint.
pub struct RemoteExtractionBackend {
    http: InferenceHttpClient,
    endpoint: String,
    model: String,
}

impl RemoteExtractionBackend {
    pub fn new(config: RemoteExtractionConfig) -> Result<Self> {
        let http = InferenceHttpClient::new(InferenceHttpConfig {
            timeout: config.timeout,
            max_retries: config.max_retries,
            ..InferenceHttpConfig::default()
        })?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
            model: config.model,
        })
    }
}

#[async_trait]
impl FieldExtractionBackend for RemoteExtractionBackend {
    #[instrument(level = "debug", skip_all, fields(model = %self.model, chars = text.len()))]
    async fn extract_fields(&self, text: &str) -> Result<CertificateFields> {
        let request = GenerationRequest {
            model: self.model.clone(),
            prompt: format!("{EXTRACTION_PROMPT}{text}"),
            temperature: 0.0,
        };

        let response: GenerationResponse = self
            .http
            .post_json(
                &self.endpoint,
                &request,
                "extraction",
                CertivaError::ExtractionUnavailable,
            )
            .await?;

        parse_generated_fields(&response.content)
    }
}

/// Parse the model output into fields, tolerating surrounding prose or
/// code fences around the JSON object.
fn parse_generated_fields(content: &str) -> Result<CertificateFields> {
    let json = extract_json_object(content).ok_or_else(|| {
        CertivaError::ExtractionUnavailable("backend returned no JSON object".into())
    })?;

    let raw: RawFields = serde_json::from_str(json).map_err(|e| {
        CertivaError::ExtractionUnavailable(format!("backend returned malformed JSON: {e}"))
    })?;

    Ok(CertificateFields {
        student_name: normalize_value(raw.student_name),
        institute_name: normalize_value(raw.institute_name),
        degree: normalize_value(raw.degree),
        major: normalize_value(raw.major),
        date_of_issue: normalize_value(raw.date_of_issue),
        certificate_id: normalize_value(raw.certificate_id),
    })
}

/// Slice out the outermost `{...}` span of the response.
fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Collapse the literal string "null" and empty strings to `None`.
fn normalize_value(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let trimmed = v.trim();
        !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("null")
    })
}

/// Mock extraction backend for testing.
pub struct MockExtractionBackend {
    outcome: MockOutcome,
}

enum MockOutcome {
    Fields(CertificateFields),
    Offline,
}

impl MockExtractionBackend {
    /// A backend that always returns the given fields.
    pub fn returning(fields: CertificateFields) -> Self {
        Self {
            outcome: MockOutcome::Fields(fields),
        }
    }

    /// A backend that simulates an unreachable endpoint.
    pub fn offline() -> Self {
        Self {
            outcome: MockOutcome::Offline,
        }
    }
}

#[async_trait]
impl FieldExtractionBackend for MockExtractionBackend {
    async fn extract_fields(&self, _text: &str) -> Result<CertificateFields> {
        match &self.outcome {
            MockOutcome::Fields(fields) => Ok(fields.clone()),
            MockOutcome::Offline => Err(CertivaError::ExtractionUnavailable(
                "mock backend is offline".into(),
            )),
        }
    }
}
