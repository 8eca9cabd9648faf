//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible
//! defaults. Collaborator endpoints are optional: an unset endpoint means
//! the corresponding surface either degrades (ledger) or requires the
//! mock-model opt-in (AI models).

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3000)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Allowed CORS origins, comma-separated (default: allow all in dev)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in MB (default: 50)
    pub body_limit_mb: usize,
    /// Maximum file size per upload in MB (default: 10)
    pub max_file_size_mb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded
    /// from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// Ledger gateway base URL (unset: degraded in-process store)
    pub ledger_gateway_url: Option<String>,
    /// Facial embedding inference endpoint
    pub face_model_url: Option<String>,
    /// Signature embedding inference endpoint
    pub signature_model_url: Option<String>,
    /// OCR endpoint
    pub ocr_url: Option<String>,
    /// Region detector endpoint
    pub detector_url: Option<String>,
    /// Generative extraction endpoint
    pub extraction_url: Option<String>,
    /// Generative extraction model identifier
    pub extraction_model: String,
    /// Allow mock collaborators where no endpoint is configured
    /// (default: false, enable with ALLOW_MOCK_MODELS=true)
    pub allow_mock_models: bool,
    /// Folder where signature crops are persisted
    pub artifacts_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            host: [127, 0, 0, 1],
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_mb: 50,
            max_file_size_mb: 10,
            timeout_secs: 30,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            ledger_gateway_url: None,
            face_model_url: None,
            signature_model_url: None,
            ocr_url: None,
            detector_url: None,
            extraction_url: None,
            extraction_model: "certificate-extractor".to_string(),
            allow_mock_models: true, // Enabled for tests; from_env() defaults to false
            artifacts_dir: PathBuf::from("artifacts/signatures"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .map(|h| {
                if h == "0.0.0.0" {
                    [0, 0, 0, 0]
                } else {
                    [127, 0, 0, 1]
                }
            })
            .unwrap_or([127, 0, 0, 1]);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let body_limit_mb = std::env::var("BODY_LIMIT_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(50);

        let max_file_size_mb = std::env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let rate_limit_per_sec = std::env::var("RATE_LIMIT_PER_SEC")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let rate_limit_burst = std::env::var("RATE_LIMIT_BURST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);

        // Rate limiting enabled by default in production, can be disabled
        // with RATE_LIMIT_ENABLED=false
        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let allow_mock_models = std::env::var("ALLOW_MOCK_MODELS")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let artifacts_dir = std::env::var("ARTIFACTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("artifacts/signatures"));

        let extraction_model = std::env::var("EXTRACTION_MODEL")
            .unwrap_or_else(|_| "certificate-extractor".to_string());

        Self {
            port,
            host,
            allowed_origins,
            body_limit_mb,
            max_file_size_mb,
            timeout_secs,
            rate_limit_enabled,
            rate_limit_per_sec,
            rate_limit_burst,
            ledger_gateway_url: std::env::var("LEDGER_GATEWAY_URL").ok(),
            face_model_url: std::env::var("FACE_MODEL_URL").ok(),
            signature_model_url: std::env::var("SIGNATURE_MODEL_URL").ok(),
            ocr_url: std::env::var("OCR_URL").ok(),
            detector_url: std::env::var("DETECTOR_URL").ok(),
            extraction_url: std::env::var("EXTRACTION_URL").ok(),
            extraction_model,
            allow_mock_models,
            artifacts_dir,
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }

    /// Maximum upload size in bytes
    pub fn max_file_size(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }
}
