use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertivaError {
    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Extraction backend unavailable: {0}")]
    ExtractionUnavailable(String),

    #[error("Region detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Text recognition unavailable: {0}")]
    OcrUnavailable(String),

    #[error("Image unreadable: {0}")]
    ImageUnreadable(String),

    #[error("Invalid certificate hash: {0}")]
    InvalidHash(String),

    #[error("Invalid account address: {0}")]
    InvalidAddress(String),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("A record is already anchored for hash {0}")]
    DuplicateRecord(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, CertivaError>;
