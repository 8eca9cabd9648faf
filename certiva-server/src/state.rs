//! Application state module
//!
//! Defines shared state accessible across all request handlers. Model
//! artifacts and the ledger client are loaded once at startup and shared
//! read-only across concurrent requests.

use std::sync::Arc;

use certiva_core::{CertificateParser, LedgerClient, VerificationEngine};

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// The verification decision engine (ledger + embedding models)
    pub engine: Arc<VerificationEngine>,
    /// Certificate parsing pipeline; `None` when OCR/detector are not
    /// configured, which turns the parsing endpoints into 503s
    pub parser: Option<Arc<CertificateParser>>,
    /// Ledger trust anchor, shared with the engine
    pub ledger: Arc<dyn LedgerClient>,
    /// Maximum upload size in bytes
    pub max_file_size: usize,
}
