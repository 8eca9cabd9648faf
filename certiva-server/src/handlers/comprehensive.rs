//! Comprehensive verification handler.

use axum::{
    extract::{Multipart, State},
    Json,
};
use certiva_core::{validate_account_address, ComprehensiveVerdict, ImagePair};

use super::{request_tempdir, spool_upload};
use crate::error::ApiError;
use crate::multipart::MultipartForm;
use crate::state::AppState;

/// Run the comprehensive verification protocol
///
/// Accepts multipart/form-data with:
/// - **certificate_hash** (required): 64-character hex content hash
/// - **account_address** (optional): submitter address, validated if present
/// - **photo1**/**photo2** (optional, together): claimed photo + reference
/// - **signature1**/**signature2** (optional, together): claimed signature + reference
///
/// The ledger lookup and the supplied biometric comparisons run
/// concurrently; every signal failure is captured in the verdict instead
/// of failing the request.
#[utoipa::path(
    post,
    path = "/certificate/verify-comprehensive",
    tag = "Verification",
    request_body(
        content_type = "multipart/form-data",
        description = "certificate_hash plus optional photo and signature pairs"
    ),
    responses(
        (status = 200, description = "Comprehensive verdict with per-signal results and failure attribution"),
        (status = 400, description = "Malformed hash, malformed address, or an incomplete image pair"),
        (status = 413, description = "Upload exceeds the size limit"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn verify_comprehensive_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ComprehensiveVerdict>, ApiError> {
    let form = MultipartForm::parse(
        &mut multipart,
        &["photo1", "photo2", "signature1", "signature2"],
        state.max_file_size,
    )
    .await?;

    let certificate_hash = form
        .get_text("certificate_hash")
        .ok_or_else(|| ApiError::bad_request("certificate_hash is required"))?;

    if let Some(address) = form.get_text("account_address") {
        validate_account_address(address)?;
    }

    let photo_pair = image_pair(&form, "photo1", "photo2")?;
    let signature_pair = image_pair(&form, "signature1", "signature2")?;

    let tmp = request_tempdir()?;
    for field in ["photo1", "photo2", "signature1", "signature2"] {
        if let Some(file) = form.get_file(field) {
            spool_upload(&tmp, field, file)?;
        }
    }

    let verdict = state
        .engine
        .verify_comprehensive(
            certificate_hash,
            photo_pair.as_ref(),
            signature_pair.as_ref(),
        )
        .await?;

    Ok(Json(verdict))
}

/// Both members of a pair or neither; a lone image is a client error.
fn image_pair(
    form: &MultipartForm,
    first: &str,
    second: &str,
) -> Result<Option<ImagePair>, ApiError> {
    match (form.get_file(first), form.get_file(second)) {
        (Some(a), Some(b)) => Ok(Some(ImagePair::new(a.data.clone(), b.data.clone()))),
        (None, None) => Ok(None),
        _ => Err(ApiError::bad_request(format!(
            "{first} and {second} must be supplied together"
        ))),
    }
}
