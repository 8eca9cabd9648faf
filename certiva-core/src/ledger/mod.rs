//! Ledger trust anchor.
//!
//! Maps a certificate content hash to a previously anchored record and
//! stores new records. Two modes, selected explicitly at construction:
//!
//! - **live** - backed by an HTTP ledger gateway; network failures and
//!   timeouts surface as [`CertivaError::LedgerUnavailable`] and are
//!   non-fatal to the rest of the system.
//! - **degraded** - an in-process store with identical semantics, used
//!   when live connectivity cannot be established.
//!
//! The active mode is queryable for health reporting and governs the
//! submitter-address policy: only the degraded store may substitute the
//! placeholder address for malformed input; live mode rejects it.

mod http;
mod memory;

pub use http::{HttpLedger, HttpLedgerConfig};
pub use memory::InMemoryLedger;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CertivaError, Result};
use crate::extract::CertificateFields;

/// Expected length of a certificate content hash (SHA3-256, hex).
pub const CERTIFICATE_HASH_LEN: usize = 64;

/// Expected length of a submitter account address (`0x` + 40 hex).
pub const ACCOUNT_ADDRESS_LEN: usize = 42;

/// Address recorded by the degraded store when the submitter is unknown.
pub const PLACEHOLDER_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Validate the certificate hash format before any ledger interaction.
pub fn validate_certificate_hash(hash: &str) -> Result<()> {
    if hash.len() != CERTIFICATE_HASH_LEN {
        return Err(CertivaError::InvalidHash(format!(
            "expected {CERTIFICATE_HASH_LEN} hex characters, got {}",
            hash.len()
        )));
    }
    if !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CertivaError::InvalidHash(
            "hash contains non-hexadecimal characters".into(),
        ));
    }
    Ok(())
}

/// Validate the submitter account address format.
pub fn validate_account_address(address: &str) -> Result<()> {
    if address.len() != ACCOUNT_ADDRESS_LEN || !address.starts_with("0x") {
        return Err(CertivaError::InvalidAddress(format!(
            "expected 0x-prefixed address of {ACCOUNT_ADDRESS_LEN} characters"
        )));
    }
    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CertivaError::InvalidAddress(
            "address contains non-hexadecimal characters".into(),
        ));
    }
    Ok(())
}

/// Which backing store a ledger client uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    /// Real ledger gateway over the network.
    Live,
    /// In-process substitute store.
    Degraded,
}

/// A record anchored on the ledger. Append-only: a hash has at most one
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub certificate_hash: String,
    pub stored_fields: CertificateFields,
    pub submitter_address: String,
    /// Unix timestamp (seconds) of the anchoring.
    pub timestamp: i64,
}

/// Hash-keyed trust store for certificate records.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Look up the record anchored for a certificate hash.
    ///
    /// `Ok(None)` means the hash has never been anchored - a valid
    /// outcome, not an error.
    async fn get(&self, certificate_hash: &str) -> Result<Option<LedgerRecord>>;

    /// Anchor a new record for a certificate hash.
    ///
    /// Fails with [`CertivaError::DuplicateRecord`] when the hash already
    /// has a record.
    async fn store(
        &self,
        certificate_hash: &str,
        fields: &CertificateFields,
        submitter_address: Option<&str>,
    ) -> Result<LedgerRecord>;

    /// The mode this client operates in.
    fn mode(&self) -> LedgerMode;
}

/// Configuration for creating ledger clients.
#[derive(Debug, Clone, Default)]
pub enum LedgerConfig {
    /// Live gateway; construction fails when the gateway is unreachable.
    Live(HttpLedgerConfig),

    /// In-process degraded store.
    #[default]
    Degraded,

    /// Probe the live gateway once, fall back to the degraded store.
    Auto(HttpLedgerConfig),
}

/// Factory for creating ledger clients.
pub struct LedgerFactory;

impl LedgerFactory {
    /// Create a ledger client from configuration.
    pub async fn create(config: LedgerConfig) -> Result<Arc<dyn LedgerClient>> {
        match config {
            LedgerConfig::Live(http_config) => {
                let ledger = HttpLedger::connect(http_config).await?;
                info!("Connected to live ledger gateway");
                Ok(Arc::new(ledger))
            }
            LedgerConfig::Degraded => Ok(Arc::new(InMemoryLedger::new())),
            LedgerConfig::Auto(http_config) => match HttpLedger::connect(http_config).await {
                Ok(ledger) => {
                    info!("Connected to live ledger gateway");
                    Ok(Arc::new(ledger))
                }
                Err(e) => {
                    warn!(error = %e, "Live ledger unreachable, using degraded in-process store");
                    Ok(Arc::new(InMemoryLedger::new()))
                }
            },
        }
    }

    /// Create a degraded in-process store.
    pub fn create_degraded() -> Arc<dyn LedgerClient> {
        Arc::new(InMemoryLedger::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_certificate_hash() {
        let hash = "a".repeat(64);
        assert!(validate_certificate_hash(&hash).is_ok());

        let hash = "0123456789abcdefABCDEF".repeat(4)[..64].to_string();
        assert!(validate_certificate_hash(&hash).is_ok());
    }

    #[test]
    fn test_hash_length_rejected() {
        assert!(validate_certificate_hash(&"a".repeat(63)).is_err());
        assert!(validate_certificate_hash(&"a".repeat(65)).is_err());
        assert!(validate_certificate_hash("").is_err());
    }

    #[test]
    fn test_non_hex_hash_rejected() {
        let hash = format!("{}g", "a".repeat(63));
        let err = validate_certificate_hash(&hash).unwrap_err();
        assert!(matches!(err, CertivaError::InvalidHash(_)));
    }

    #[test]
    fn test_account_address_validation() {
        assert!(validate_account_address(PLACEHOLDER_ADDRESS).is_ok());
        assert!(validate_account_address(&format!("0x{}", "ab".repeat(20))).is_ok());

        assert!(validate_account_address("0x1234").is_err());
        assert!(validate_account_address(&"a".repeat(42)).is_err());
        assert!(validate_account_address(&format!("0x{}", "zz".repeat(20))).is_err());
    }

    #[tokio::test]
    async fn test_factory_degraded() {
        let ledger = LedgerFactory::create(LedgerConfig::Degraded).await.unwrap();
        assert_eq!(ledger.mode(), LedgerMode::Degraded);
    }
}
