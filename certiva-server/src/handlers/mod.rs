//! Request handlers
//!
//! One module per endpoint group. All upload handlers spool their files
//! into an isolated per-request temporary directory that is removed on
//! every exit path when the guard drops.

pub mod certificate;
pub mod comprehensive;
pub mod health;
pub mod similarity;

pub use certificate::{
    get_ledger_record_handler, parse_certificate_handler, store_blockchain_handler, StoreResponse,
};
pub use comprehensive::verify_comprehensive_handler;
pub use health::{health_handler, AiModelsLoaded, HealthResponse};
pub use similarity::{verify_faces_handler, verify_signatures_handler};

use std::path::PathBuf;

use tempfile::TempDir;

use crate::error::ApiError;
use crate::multipart::UploadedFile;
use crate::validation::sanitize_filename;

/// Create the isolated temporary directory for one request's uploads.
pub(crate) fn request_tempdir() -> Result<TempDir, ApiError> {
    TempDir::new().map_err(|e| ApiError::internal(format!("Failed to create temp dir: {e}")))
}

/// Write an upload into the request's temporary directory under its
/// sanitized filename, prefixed with the field name so identical
/// filenames in different slots cannot collide.
pub(crate) fn spool_upload(
    dir: &TempDir,
    field: &str,
    file: &UploadedFile,
) -> Result<PathBuf, ApiError> {
    let name = sanitize_filename(file.file_name.as_deref().unwrap_or("upload"));
    let path = dir.path().join(format!("{field}-{name}"));
    std::fs::write(&path, &file.data)
        .map_err(|e| ApiError::internal(format!("Failed to spool upload: {e}")))?;
    Ok(path)
}
