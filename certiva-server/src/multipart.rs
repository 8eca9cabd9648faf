//! Multipart form parsing helpers
//!
//! Reusable abstraction for parsing multipart/form-data uploads across
//! handlers. Endpoints here routinely take several named file slots
//! (file1/file2, photo1/photo2, ...), so files are indexed by field name.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::ApiError;
use crate::validation::{validate_content_type, validate_extension, validate_file_size};

/// Represents a file uploaded via multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File data bytes
    pub data: Vec<u8>,
    /// Content-Type from the multipart field (if provided)
    pub content_type: Option<String>,
    /// Original filename from the multipart field (if provided)
    pub file_name: Option<String>,
}

/// Parsed multipart form fields
///
/// Provides structured access to file and text fields from a
/// multipart/form-data request. Each file slot is validated (MIME type,
/// extension, size) while parsing, before any handler processing begins.
#[derive(Debug, Default)]
pub struct MultipartForm {
    /// File fields indexed by name
    files: HashMap<String, UploadedFile>,
    /// Text fields indexed by name
    text_fields: HashMap<String, String>,
}

impl MultipartForm {
    /// Parse all fields from a multipart request.
    ///
    /// Field names listed in `file_fields` are treated as file uploads
    /// and validated; everything else is read as text.
    pub async fn parse(
        multipart: &mut Multipart,
        file_fields: &[&str],
        max_file_size: usize,
    ) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to parse multipart: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();

            if file_fields.contains(&name.as_str()) {
                let content_type = field.content_type().map(|s| s.to_string());
                let file_name = field.file_name().map(|s| s.to_string());

                validate_content_type(content_type.as_deref())?;
                validate_extension(file_name.as_deref())?;

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        ApiError::bad_request(format!("Failed to read file '{name}': {e}"))
                    })?
                    .to_vec();

                validate_file_size(data.len(), max_file_size)?;

                form.files.insert(
                    name,
                    UploadedFile {
                        data,
                        content_type,
                        file_name,
                    },
                );
            } else {
                let value = field.text().await.map_err(|e| {
                    ApiError::bad_request(format!("Failed to read field '{name}': {e}"))
                })?;
                form.text_fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Get a file field (required).
    pub fn require_file(&self, name: &str) -> Result<&UploadedFile, ApiError> {
        self.files.get(name).ok_or_else(|| {
            ApiError::bad_request(format!(
                "No file provided. Use '{name}' field in multipart form."
            ))
        })
    }

    /// Get a file field (optional).
    pub fn get_file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }

    /// Get a text field value.
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.text_fields.get(name).map(|s| s.as_str())
    }

    /// Get a text field parsed as f32.
    ///
    /// Returns `Ok(None)` when the field is missing or empty, an error
    /// when it is present but unparsable.
    pub fn get_f32(&self, name: &str) -> Result<Option<f32>, ApiError> {
        match self.text_fields.get(name) {
            Some(value) if !value.trim().is_empty() => value
                .trim()
                .parse::<f32>()
                .map(Some)
                .map_err(|_| ApiError::bad_request(format!("Invalid number in '{name}'"))),
            _ => Ok(None),
        }
    }
}
