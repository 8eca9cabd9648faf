//! Certificate parsing and ledger anchoring handlers.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use certiva_core::{LedgerRecord, ParsedCertificate};
use serde::Serialize;
use tracing::info;

use super::{request_tempdir, spool_upload};
use crate::error::ApiError;
use crate::multipart::MultipartForm;
use crate::state::AppState;

/// Response for a successful ledger store
#[derive(Serialize)]
pub struct StoreResponse {
    /// Content hash the certificate was anchored under
    pub certificate_hash: String,
    /// The anchored record as the ledger reports it
    pub record: LedgerRecord,
}

/// Parse an uploaded certificate document
///
/// Accepts multipart/form-data with:
/// - **file** (required): certificate scan (.pdf/.jpg/.jpeg/.png)
///
/// Returns the structured fields, the stored signature artifacts, and the
/// content hash used as the ledger key.
#[utoipa::path(
    post,
    path = "/parse-certificate",
    tag = "Certificates",
    request_body(
        content_type = "multipart/form-data",
        description = "Certificate document to parse"
    ),
    responses(
        (status = 200, description = "Parsed certificate with fields, artifacts, and content hash"),
        (status = 400, description = "Invalid or unreadable upload"),
        (status = 413, description = "Upload exceeds the size limit"),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Certificate parser not configured or a collaborator is unreachable")
    )
)]
pub async fn parse_certificate_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ParsedCertificate>, ApiError> {
    let parser = state.parser.as_ref().ok_or_else(|| {
        ApiError::service_unavailable("Certificate parser is not configured")
    })?;

    let form = MultipartForm::parse(&mut multipart, &["file"], state.max_file_size).await?;
    let file = form.require_file("file")?;

    let tmp = request_tempdir()?;
    let spooled = spool_upload(&tmp, "file", file)?;
    let source = spooled
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();

    let parsed = parser.parse(&source, &file.data).await?;
    Ok(Json(parsed))
}

/// Parse a certificate and anchor it on the ledger
///
/// Accepts multipart/form-data with:
/// - **file** (required): certificate scan
/// - **account_address** (optional): submitter address (`0x` + 40 hex);
///   required in live ledger mode, substituted with a placeholder in
///   degraded mode
#[utoipa::path(
    post,
    path = "/certificate/store-blockchain",
    tag = "Certificates",
    request_body(
        content_type = "multipart/form-data",
        description = "Certificate document and submitter account address"
    ),
    responses(
        (status = 201, description = "Certificate anchored on the ledger"),
        (status = 400, description = "Invalid upload or malformed account address"),
        (status = 409, description = "A record is already anchored for this certificate"),
        (status = 413, description = "Upload exceeds the size limit"),
        (status = 503, description = "Parser not configured or ledger unreachable")
    )
)]
pub async fn store_blockchain_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoreResponse>), ApiError> {
    let parser = state.parser.as_ref().ok_or_else(|| {
        ApiError::service_unavailable("Certificate parser is not configured")
    })?;

    let form = MultipartForm::parse(&mut multipart, &["file"], state.max_file_size).await?;
    let file = form.require_file("file")?;
    let account_address = form.get_text("account_address");

    let tmp = request_tempdir()?;
    let spooled = spool_upload(&tmp, "file", file)?;
    let source = spooled
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();

    let parsed = parser.parse(&source, &file.data).await?;
    let record = state
        .ledger
        .store(&parsed.content_hash, &parsed.fields, account_address)
        .await?;

    info!(hash = %record.certificate_hash, "Certificate anchored");

    Ok((
        StatusCode::CREATED,
        Json(StoreResponse {
            certificate_hash: record.certificate_hash.clone(),
            record,
        }),
    ))
}

/// Look up the anchored record for a certificate hash
#[utoipa::path(
    get,
    path = "/certificate/blockchain/{certificate_hash}",
    tag = "Certificates",
    params(
        ("certificate_hash" = String, Path, description = "64-character hex content hash")
    ),
    responses(
        (status = 200, description = "The anchored ledger record"),
        (status = 400, description = "Malformed certificate hash"),
        (status = 404, description = "No record anchored for this hash"),
        (status = 503, description = "Ledger unreachable")
    )
)]
pub async fn get_ledger_record_handler(
    State(state): State<AppState>,
    Path(certificate_hash): Path<String>,
) -> Result<Json<LedgerRecord>, ApiError> {
    let record = state
        .ledger
        .get(&certificate_hash)
        .await?
        .ok_or_else(|| ApiError::not_found("No record anchored for this certificate hash"))?;

    Ok(Json(record))
}
