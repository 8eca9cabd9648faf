//! Live ledger gateway client.
//!
//! Talks to an HTTP gateway fronting the distributed ledger contract.
//! Every transport failure - connection refused, timeout, unexpected
//! status - maps to [`CertivaError::LedgerUnavailable`]; callers treat
//! that as a degraded signal, not a fatal error. There is no retry here:
//! retries belong to the gateway's own infrastructure.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{
    validate_account_address, validate_certificate_hash, LedgerClient, LedgerMode, LedgerRecord,
};
use crate::error::{CertivaError, Result};
use crate::extract::CertificateFields;

/// Configuration for the HTTP ledger gateway client.
#[derive(Debug, Clone)]
pub struct HttpLedgerConfig {
    /// Gateway base URL.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpLedgerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
struct StoreRecordRequest<'a> {
    certificate_hash: &'a str,
    stored_fields: &'a CertificateFields,
    submitter_address: &'a str,
}

/// Ledger client backed by a live HTTP gateway.
pub struct HttpLedger {
    client: Client,
    endpoint: String,
}

impl HttpLedger {
    /// Create a client without probing the gateway.
    pub fn new(config: HttpLedgerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                CertivaError::LedgerUnavailable(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client and verify the gateway answers its health probe.
    pub async fn connect(config: HttpLedgerConfig) -> Result<Self> {
        let ledger = Self::new(config)?;
        ledger.ping().await?;
        Ok(ledger)
    }

    /// Probe gateway connectivity.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/health", self.endpoint);
        let response = self.client.get(&url).send().await.map_err(|e| {
            CertivaError::LedgerUnavailable(format!("gateway health probe failed: {e}"))
        })?;

        if !response.status().is_success() {
            return Err(CertivaError::LedgerUnavailable(format!(
                "gateway health probe returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerClient for HttpLedger {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, certificate_hash: &str) -> Result<Option<LedgerRecord>> {
        validate_certificate_hash(certificate_hash)?;
        let hash = certificate_hash.to_lowercase();

        let url = format!("{}/records/{}", self.endpoint, hash);
        let response = self.client.get(&url).send().await.map_err(|e| {
            CertivaError::LedgerUnavailable(format!("record lookup failed: {e}"))
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let record: LedgerRecord = response.json().await.map_err(|e| {
                    CertivaError::LedgerUnavailable(format!("malformed gateway response: {e}"))
                })?;
                debug!(hash = %hash, "Ledger record found");
                Ok(Some(record))
            }
            status => Err(CertivaError::LedgerUnavailable(format!(
                "record lookup returned status {status}"
            ))),
        }
    }

    #[instrument(level = "debug", skip(self, fields))]
    async fn store(
        &self,
        certificate_hash: &str,
        fields: &CertificateFields,
        submitter_address: Option<&str>,
    ) -> Result<LedgerRecord> {
        validate_certificate_hash(certificate_hash)?;
        let hash = certificate_hash.to_lowercase();

        // Live mode never substitutes a placeholder: the submitter must be
        // present and well-formed.
        let submitter = submitter_address.ok_or_else(|| {
            CertivaError::InvalidAddress("submitter address is required in live mode".into())
        })?;
        validate_account_address(submitter)?;

        let url = format!("{}/records", self.endpoint);
        let request = StoreRecordRequest {
            certificate_hash: &hash,
            stored_fields: fields,
            submitter_address: submitter,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CertivaError::LedgerUnavailable(format!("record store failed: {e}")))?;

        match response.status() {
            StatusCode::CONFLICT => Err(CertivaError::DuplicateRecord(hash)),
            status if status.is_success() => {
                let record: LedgerRecord = response.json().await.map_err(|e| {
                    CertivaError::LedgerUnavailable(format!("malformed gateway response: {e}"))
                })?;
                debug!(hash = %record.certificate_hash, "Ledger record anchored");
                Ok(record)
            }
            status => Err(CertivaError::LedgerUnavailable(format!(
                "record store returned status {status}"
            ))),
        }
    }

    fn mode(&self) -> LedgerMode {
        LedgerMode::Live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let ledger = HttpLedger::new(HttpLedgerConfig::new("http://ledger.local/")).unwrap();
        assert_eq!(ledger.endpoint, "http://ledger.local");
        assert_eq!(ledger.mode(), LedgerMode::Live);
    }

    #[tokio::test]
    async fn test_invalid_hash_rejected_before_any_request() {
        // Unroutable endpoint: if validation did not come first, this
        // would time out instead of failing fast.
        let ledger = HttpLedger::new(HttpLedgerConfig {
            endpoint: "http://192.0.2.1:1".into(),
            timeout: Duration::from_secs(30),
        })
        .unwrap();

        let err = ledger.get("not-a-hash").await.unwrap_err();
        assert!(matches!(err, CertivaError::InvalidHash(_)));
    }

    #[tokio::test]
    async fn test_live_store_requires_submitter() {
        let ledger = HttpLedger::new(HttpLedgerConfig {
            endpoint: "http://192.0.2.1:1".into(),
            timeout: Duration::from_secs(30),
        })
        .unwrap();

        let hash = "a".repeat(64);
        let err = ledger
            .store(&hash, &CertificateFields::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CertivaError::InvalidAddress(_)));

        let err = ledger
            .store(&hash, &CertificateFields::default(), Some("0xbad"))
            .await
            .unwrap_err();
        assert!(matches!(err, CertivaError::InvalidAddress(_)));
    }
}
