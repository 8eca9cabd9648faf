//! Biometric comparison handlers
//!
//! POST /verify-faces and POST /verify-signatures share one code path:
//! two uploads in, one [`SimilarityResult`] out. They differ only in the
//! embedding model the engine routes to and the default threshold.

use axum::{
    extract::{Multipart, State},
    Json,
};
use certiva_core::SimilarityResult;

use super::{request_tempdir, spool_upload};
use crate::error::ApiError;
use crate::multipart::MultipartForm;
use crate::state::AppState;

/// Which comparison channel a request targets.
enum Channel {
    Faces,
    Signatures,
}

/// Compare two face photos
///
/// Accepts multipart/form-data with:
/// - **file1** (required): first face photo
/// - **file2** (required): second face photo
/// - **threshold** (optional): match threshold, default 0.9
#[utoipa::path(
    post,
    path = "/verify-faces",
    tag = "Biometrics",
    request_body(
        content_type = "multipart/form-data",
        description = "file1, file2 and an optional threshold (default 0.9)"
    ),
    responses(
        (status = 200, description = "Similarity result with distance, prediction, and confidence"),
        (status = 400, description = "Invalid upload, bad threshold, or no detectable face"),
        (status = 413, description = "Upload exceeds the size limit"),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Embedding backend unreachable")
    )
)]
pub async fn verify_faces_handler(
    state: State<AppState>,
    multipart: Multipart,
) -> Result<Json<SimilarityResult>, ApiError> {
    compare_uploads(state, multipart, Channel::Faces).await
}

/// Compare two signature images
///
/// Accepts multipart/form-data with:
/// - **file1** (required): first signature image
/// - **file2** (required): second signature image
/// - **threshold** (optional): match threshold, default 0.5
#[utoipa::path(
    post,
    path = "/verify-signatures",
    tag = "Biometrics",
    request_body(
        content_type = "multipart/form-data",
        description = "file1, file2 and an optional threshold (default 0.5)"
    ),
    responses(
        (status = 200, description = "Similarity result with distance, prediction, and confidence"),
        (status = 400, description = "Invalid upload, bad threshold, or no detectable signature"),
        (status = 413, description = "Upload exceeds the size limit"),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Embedding backend unreachable")
    )
)]
pub async fn verify_signatures_handler(
    state: State<AppState>,
    multipart: Multipart,
) -> Result<Json<SimilarityResult>, ApiError> {
    compare_uploads(state, multipart, Channel::Signatures).await
}

async fn compare_uploads(
    State(state): State<AppState>,
    mut multipart: Multipart,
    channel: Channel,
) -> Result<Json<SimilarityResult>, ApiError> {
    let form =
        MultipartForm::parse(&mut multipart, &["file1", "file2"], state.max_file_size).await?;
    let first = form.require_file("file1")?;
    let second = form.require_file("file2")?;
    let threshold = form.get_f32("threshold")?;

    // Guard drops at the end of the request, removing the spooled files
    // on every exit path.
    let tmp = request_tempdir()?;
    spool_upload(&tmp, "file1", first)?;
    spool_upload(&tmp, "file2", second)?;

    let result = match channel {
        Channel::Faces => {
            state
                .engine
                .verify_faces(&first.data, &second.data, threshold)
                .await?
        }
        Channel::Signatures => {
            state
                .engine
                .verify_signatures(&first.data, &second.data, threshold)
                .await?
        }
    };

    Ok(Json(result))
}
