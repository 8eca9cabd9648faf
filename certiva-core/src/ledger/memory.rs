//! Degraded in-process ledger store.
//!
//! Same contract as the live gateway, backed by a concurrent map. Used
//! when ledger connectivity cannot be established, and in tests. This is
//! the only mode allowed to substitute the placeholder submitter address.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, warn};

use super::{
    validate_account_address, validate_certificate_hash, LedgerClient, LedgerMode, LedgerRecord,
    PLACEHOLDER_ADDRESS,
};
use crate::error::{CertivaError, Result};
use crate::extract::CertificateFields;

/// In-process hash-keyed record store with ledger semantics.
#[derive(Default)]
pub struct InMemoryLedger {
    records: DashMap<String, LedgerRecord>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of anchored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn get(&self, certificate_hash: &str) -> Result<Option<LedgerRecord>> {
        validate_certificate_hash(certificate_hash)?;
        let hash = certificate_hash.to_lowercase();
        Ok(self.records.get(&hash).map(|r| r.clone()))
    }

    async fn store(
        &self,
        certificate_hash: &str,
        fields: &CertificateFields,
        submitter_address: Option<&str>,
    ) -> Result<LedgerRecord> {
        validate_certificate_hash(certificate_hash)?;
        let hash = certificate_hash.to_lowercase();

        // Degraded mode substitutes the well-known placeholder for a
        // missing or malformed submitter.
        let submitter = match submitter_address {
            Some(address) if validate_account_address(address).is_ok() => address.to_string(),
            Some(address) => {
                warn!(address, "Malformed submitter address, using placeholder");
                PLACEHOLDER_ADDRESS.to_string()
            }
            None => PLACEHOLDER_ADDRESS.to_string(),
        };

        match self.records.entry(hash.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(CertivaError::DuplicateRecord(hash))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let record = LedgerRecord {
                    certificate_hash: hash,
                    stored_fields: fields.clone(),
                    submitter_address: submitter,
                    timestamp: Utc::now().timestamp(),
                };
                slot.insert(record.clone());
                debug!(hash = %record.certificate_hash, "Anchored record in degraded store");
                Ok(record)
            }
        }
    }

    fn mode(&self) -> LedgerMode {
        LedgerMode::Degraded
    }
}
