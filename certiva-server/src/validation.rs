//! Upload validation module
//!
//! Validation utilities for multipart certificate/biometric uploads.

use crate::error::ApiError;

/// Allowed upload extensions (lowercase, without the dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

/// Default max file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Maximum filename length in bytes after sanitization.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Validates the Content-Type of an uploaded file.
///
/// Accepts `image/*` and `application/pdf`. A missing Content-Type is
/// allowed; the extension check still applies.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ct_lower.starts_with("image/") || ct_lower == "application/pdf" {
                Ok(())
            } else {
                Err(ApiError::bad_request(format!(
                    "Unsupported Content-Type: '{ct}'. Allowed types: image/*, application/pdf"
                )))
            }
        }
        None => Ok(()),
    }
}

/// Validates the extension of an uploaded file name.
///
/// A missing filename is allowed; the Content-Type check still applies.
pub fn validate_extension(file_name: Option<&str>) -> Result<(), ApiError> {
    let Some(name) = file_name else {
        return Ok(());
    };

    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase());
    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(ApiError::bad_request(format!(
            "Unsupported file extension in '{name}'. Allowed: .pdf, .jpg, .jpeg, .png"
        ))),
    }
}

/// Validates the size of an uploaded file.
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        Err(ApiError::payload_too_large(format!(
            "File of {size} bytes exceeds maximum of {max_mb} MB"
        )))
    } else {
        Ok(())
    }
}

/// Sanitize an uploaded filename before any use on disk: strip path
/// separators and control characters, truncate to
/// [`MAX_FILENAME_BYTES`], and fall back to "upload" when nothing
/// usable remains.
pub fn sanitize_filename(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && *c != '/' && *c != '\\')
        .collect();

    if cleaned.len() > MAX_FILENAME_BYTES {
        let mut cut = MAX_FILENAME_BYTES;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }

    if cleaned.trim_matches(['.', ' ']).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
